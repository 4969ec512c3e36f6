//! JSON test vector loader shared by payload tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub frame: String,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

pub fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).expect("missing test vector")
}

pub fn load_cases(name: &str) -> Vec<TestVector> {
    serde_json::from_str(&load(name)).expect("invalid test vector file")
}
