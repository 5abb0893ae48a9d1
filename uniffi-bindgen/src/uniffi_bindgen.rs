//! Generates foreign-language bindings for `sessionkit-core` built with the `ffi` feature.

fn main() {
    uniffi::uniffi_bindgen_main();
}
