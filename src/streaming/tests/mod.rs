//! Loop and cursor tests against a scripted in-memory service

mod cursor;
