#[cfg(test)]
mod tests {
    use crate::output::{print_json, OutputMode};

    #[test]
    fn output_modes_distinct() {
        assert_ne!(OutputMode::Json, OutputMode::Human);
    }

    #[test]
    fn print_json_valid() {
        let val = serde_json::json!({"name": "node", "status": "private key stored"});
        assert!(print_json(&val).is_ok());
    }

    #[test]
    fn print_json_list() {
        assert!(print_json(&vec!["a", "b"]).is_ok());
    }
}
