use std::fmt;

/// A piece of an assistant answer, in the order the agent streamed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// SQL generated by the text-to-SQL tool
    Sql(String),
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(text) => f.write_str(text),
            Fragment::Sql(sql) => write!(f, "\n\n`{}`", sql),
        }
    }
}
