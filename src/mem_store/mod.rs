pub mod cube;
pub mod cubedb;
pub mod dictionary;
pub mod partition;

pub use cube::Cube;
pub use cubedb::Cubedb;
pub use dictionary::Dictionary;
pub use partition::Partition;
