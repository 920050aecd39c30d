pub use super::test_blog::Entity as TestBlog;
pub use super::test_comment::Entity as TestComment;
pub use super::test_commentary::Entity as TestCommentary;
pub use super::test_star::Entity as TestStar;
pub use super::test_user::Entity as TestUser;
