use std::collections::HashMap;

/// A single `INSERT`: which cube/partition it targets, the column values
/// that make up its composite key, and the count to add.
#[derive(Debug, Clone)]
pub struct InsertRow {
    pub cube: String,
    pub partition: String,
    pub columns: HashMap<String, String>,
    pub count: u64,
}

/// An ordered per-column ANY-of predicate. A row matches a filter iff, for
/// every column named here, at least one of its listed values equals the
/// row's value for that column; unmentioned columns are unconstrained.
/// Unlike [`InsertRow::columns`], a column name may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub constraints: Vec<(String, String)>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CvListError {
    Malformed,
    DuplicateColumn,
}

/// `"null"` (any case) or the empty string mark a nullable position as
/// unset: partition bounds, a filter, or a group column.
pub fn is_unset(token: &str) -> bool {
    token.is_empty() || token.eq_ignore_ascii_case("null")
}

fn split_pairs(token: &str) -> Result<Vec<(String, String)>, CvListError> {
    if is_unset(token) {
        return Ok(Vec::new());
    }
    let mut pairs = Vec::new();
    for part in token.split('&') {
        let mut split = part.splitn(2, '=');
        let column = split.next().filter(|c| !c.is_empty()).ok_or(CvListError::Malformed)?;
        let value = split.next().ok_or(CvListError::Malformed)?;
        pairs.push((column.to_string(), value.to_string()));
    }
    Ok(pairs)
}

/// Parses an `INSERT`'s `col=val(&col=val)*` argument. Column names must be
/// unique; a repeat is a wire error, not a last-write-wins overwrite.
pub fn parse_insert_columns(token: &str) -> Result<HashMap<String, String>, CvListError> {
    let pairs = split_pairs(token)?;
    let mut columns = HashMap::with_capacity(pairs.len());
    for (column, value) in pairs {
        if columns.insert(column, value).is_some() {
            return Err(CvListError::DuplicateColumn);
        }
    }
    Ok(columns)
}

/// Parses a `COUNT`/`PCOUNT` filter argument. Repeated columns are legal.
pub fn parse_filter(token: &str) -> Result<Filter, CvListError> {
    Ok(Filter {
        constraints: split_pairs(token)?,
    })
}
