pub mod categories;
pub mod parents;
pub mod progress;
pub mod questions;
pub mod quizzes;
pub mod submissions;
pub mod users;
