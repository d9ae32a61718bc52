use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub auth_store: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, auth_store: PathBuf) -> Self {
        Self {
            api_url,
            auth_store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "http://localhost:8080/api/v1".to_string(),
            PathBuf::from("authData.json"),
        );
        assert_eq!(args.api_url, "http://localhost:8080/api/v1");
        assert_eq!(args.auth_store, PathBuf::from("authData.json"));
    }
}
