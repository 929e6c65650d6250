use log::{debug, warn};
use regex::Regex;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    error::{Result, SalesError},
    schema::Column,
    table::SalesTable,
};

#[derive(Debug)]
struct Group {
    name: String,
    regex: Regex,
}

/// Product group configuration.
///
/// Products whose name matches a group's regular expression are reported as
/// a single product named after the group.
#[derive(Debug, Default)]
pub struct Groups(Vec<Group>);

impl Groups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads product group configuration from `path`.
    ///
    /// The configuration file consists of group specifications, one per line,
    /// in the following format:
    ///
    /// ```txt
    /// GROUP_NAME | GROUP_REGEX
    /// ```
    ///
    /// Blank lines are ignored. `GROUP_REGEX` can be any regular expression
    /// supported by [`regex::Regex`].
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be opened or read
    /// * There is a line with an invalid format (no `|` character)
    /// * `GROUP_REGEX` is an invalid regular expression
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SalesError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SalesError::Io(e),
        })?;
        let mut groups = Self::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((name, regex_str)) = line.split_once(" | ") else {
                return Err(SalesError::Configuration(format!(
                    "reading {path:?}: bad line format (missing |): {line}"
                )));
            };
            groups.add(name.trim(), regex_str.trim())?;
        }
        debug!("{}: read {} product groups", path.display(), groups.0.len());
        Ok(groups)
    }

    /// Adds a new group.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Configuration`] if `regex_str` does not compile.
    pub fn add(&mut self, name: &str, regex_str: &str) -> Result<()> {
        let regex = Regex::new(regex_str).map_err(|e| {
            SalesError::Configuration(format!("group {name:?}: invalid regex: {e}"))
        })?;
        self.0.push(Group {
            name: name.to_string(),
            regex,
        });
        Ok(())
    }

    /// Returns the product group for `product`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// # use salesdash::Groups;
    /// let mut groups = Groups::new();
    /// groups.add("Foo", "foo").unwrap();
    /// assert_eq!(groups.product_group("foo variant 1"), Some("Foo"));
    /// assert_eq!(groups.product_group("ungrouped product"), None);
    /// ```
    #[must_use]
    pub fn product_group(&self, product: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|g| g.regex.is_match(product))
            .map(|g| g.name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of `table` with grouped products replaced by their group
    /// name.
    ///
    /// Products are matched on the column that identifies them: the product
    /// name, or the product id when the table has no `product_name` column.
    #[must_use]
    pub fn relabel(&self, table: &SalesTable) -> SalesTable {
        if self.is_empty() {
            return table.clone();
        }
        let Some(column) = table.schema().product_column() else {
            warn!("no product column found, product groups not applied");
            return table.clone();
        };
        table.map(|record| {
            let product = match column {
                Column::ProductId => &mut record.product_id,
                _ => &mut record.product_name,
            };
            if let Some(group) = product.as_deref().and_then(|p| self.product_group(p)) {
                *product = Some(group.to_string());
            }
        })
    }
}
