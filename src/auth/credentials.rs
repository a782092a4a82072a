use crate::model::directory::Directory;
use crate::model::role::UserScope;

impl Directory {
    /// Exact, case-sensitive comparison against the stored plaintext password.
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.credential(username)
            .is_some_and(|credential| credential.password == password)
    }

    pub fn resolve_scope(&self, username: &str) -> Option<UserScope> {
        self.credential(username).map(|credential| UserScope {
            role: credential.role,
            office: credential.office.clone(),
        })
    }
}
