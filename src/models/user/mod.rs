pub mod list;
pub mod types;

pub use list::{ActionKind, ListError, ListSnapshot, UserListController, UserListRegistry};
pub use types::{NewUser, Role, User, UserForm, UserPatch};
