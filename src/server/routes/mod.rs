mod categories;
mod parents;
mod payments;
mod progress;
mod questions;
mod quizzes;
mod users;

pub use categories::category_router;
pub use parents::parents_router;
pub use payments::payments_router;
pub use progress::progress_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;
pub use users::users_router;
