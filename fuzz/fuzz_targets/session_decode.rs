#![no_main]

use codec::{Session, SessionConfig, SessionState, TypeRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let mut session = Session::new(SessionConfig::for_testing());
    session.start_deserializing_with(body.to_vec()).unwrap();
    let registry = TypeRegistry::new();

    // Read until the first failure; every failure must leave the session in the error state.
    for _ in 0..64 {
        let result = match selector % 4 {
            0 => session.get_object(&registry).map(drop),
            1 => session.get_string_minimal().map(drop),
            2 => session.get_string_compressed().map(drop),
            _ => session.get_string_ascii().map(drop),
        };
        if result.is_err() {
            assert_eq!(session.state(), SessionState::Error);
            assert!(session.last_error().is_some());
            return;
        }
    }
});
