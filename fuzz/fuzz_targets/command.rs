//! Fuzz target for input line parsing.
//!
//! Any line either parses or yields a one-line error. Queries are never
//! blank.

#![no_main]

use libfuzzer_sys::fuzz_target;

use sqlvis::command::Command;

fuzz_target!(|line: &str| {
    match Command::parse(line) {
        Ok(Some(Command::Query(sql))) => assert!(!sql.trim().is_empty()),
        Ok(_) => {}
        Err(err) => assert!(!err.to_string().contains('\n')),
    }
});
