//! Routing collaborator

use crate::error::RouterError;

/// The application's navigation primitive
pub trait Router {
    /// Path of the route currently shown
    fn current_path(&self) -> String;
    /// Number of entries in the session history
    fn history_len(&self) -> usize;
    fn push(&mut self, path: &str) -> Result<(), RouterError>;
    fn replace(&mut self, path: &str) -> Result<(), RouterError>;
    fn back(&mut self) -> Result<(), RouterError>;
}

/// Session history kept in memory
#[derive(Debug, Clone)]
pub struct MemoryRouter {
    entries: Vec<String>,
    index: usize,
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryRouter {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_string()],
            index: 0,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Router for MemoryRouter {
    fn current_path(&self) -> String {
        self.entries[self.index].clone()
    }

    fn history_len(&self) -> usize {
        self.entries.len()
    }

    fn push(&mut self, path: &str) -> Result<(), RouterError> {
        // Pushing drops any forward entries
        self.entries.truncate(self.index + 1);
        self.entries.push(path.to_string());
        self.index += 1;
        Ok(())
    }

    fn replace(&mut self, path: &str) -> Result<(), RouterError> {
        self.entries[self.index] = path.to_string();
        Ok(())
    }

    fn back(&mut self) -> Result<(), RouterError> {
        if self.index == 0 {
            return Err(RouterError::Navigation {
                path: self.current_path(),
                reason: "no earlier history entry".to_string(),
            });
        }
        self.index -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let mut router = MemoryRouter::new("/");
        router.push("/gallery").unwrap();
        router.push("/gallery/42").unwrap();
        assert_eq!(router.history_len(), 3);

        router.back().unwrap();
        assert_eq!(router.current_path(), "/gallery");
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut router = MemoryRouter::new("/");
        router.push("/a").unwrap();
        router.back().unwrap();
        router.push("/b").unwrap();
        assert_eq!(router.entries(), &["/".to_string(), "/b".to_string()]);
    }

    #[test]
    fn test_replace_keeps_length() {
        let mut router = MemoryRouter::new("/");
        router.replace("/home").unwrap();
        assert_eq!(router.history_len(), 1);
        assert_eq!(router.current_path(), "/home");
        assert!(router.back().is_err());
    }
}
