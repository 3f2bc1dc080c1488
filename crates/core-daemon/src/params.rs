//! Typed access to request params.
//!
//! All parsing failures become `InvalidArgs`; numbers are accepted as JSON
//! numbers or numeric strings, matching what shell-driven clients send.

use serde_json::{Map, Value};

use core_rpc::RpcError;

pub struct Params<'a>(pub &'a Map<String, Value>);

impl<'a> Params<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>, RpcError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| RpcError::invalid_args(format!("{key} must be an integer"))),
            Some(Value::String(s)) => s
                .parse::<u64>()
                .map(Some)
                .map_err(|_| RpcError::invalid_args(format!("{key} must be an integer"))),
            Some(_) => Err(RpcError::invalid_args(format!("{key} must be an integer"))),
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64, RpcError> {
        Ok(self.opt_u64(key)?.unwrap_or(default))
    }

    pub fn require_u64(&self, key: &str) -> Result<u64, RpcError> {
        self.opt_u64(key)?
            .ok_or_else(|| RpcError::invalid_args(format!("missing {key} parameter")))
    }

    pub fn opt_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&'a str, RpcError> {
        self.opt_str(key)
            .ok_or_else(|| RpcError::invalid_args(format!("missing {key}")))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, RpcError> {
        Ok(self.opt_u64(key)?.map(|v| v as usize).unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn numbers_accepted_as_numbers_or_strings() {
        let map = params(json!({"eid": 42, "mip": "3"}));
        let p = Params(&map);
        assert_eq!(p.opt_u64("eid").unwrap(), Some(42));
        assert_eq!(p.opt_u64("mip").unwrap(), Some(3));
        assert_eq!(p.opt_u64("absent").unwrap(), None);
    }

    #[test]
    fn bad_numbers_are_invalid_args() {
        let map = params(json!({"eid": "abc", "x": true}));
        let p = Params(&map);
        assert!(p.opt_u64("eid").is_err());
        assert!(p.opt_u64("x").is_err());
    }

    #[test]
    fn missing_required_named_in_message() {
        let map = params(json!({}));
        let p = Params(&map);
        let err = p.require_u64("eid").unwrap_err();
        assert!(err.message.contains("eid"));
    }

    #[test]
    fn null_is_treated_as_absent() {
        let map = params(json!({"section": null}));
        let p = Params(&map);
        assert_eq!(p.opt_str("section"), None);
        assert_eq!(p.opt_u64("section").unwrap(), None);
    }
}
