//! Log parsing for plain-text checkpoint logs (marks.tsv).

pub mod parse;

pub use parse::parse_marks_file;
