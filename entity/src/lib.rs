//! SeaORM entities for the tables the fixture tests persist into.
//!
//! The tables carry no foreign-key constraints so a fixture can be inserted with or without
//! its related records, the way the factories under test decide.

pub mod prelude;

pub mod test_blog;
pub mod test_comment;
pub mod test_commentary;
pub mod test_star;
pub mod test_user;
