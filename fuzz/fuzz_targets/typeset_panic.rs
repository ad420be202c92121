#![no_main]
use libfuzzer_sys::fuzz_target;
use mathbox_layout::{RenderMode, RenderOptions, StaticInteraction, measure, render};

fuzz_target!(|data: &[u8]| {
    // Live-typed input: every string must lay out and render.
    let s = String::from_utf8_lossy(data);
    let _ = measure(&s, 16.0);

    let handler = StaticInteraction::default();
    for mode in [RenderMode::Mixed, RenderMode::Math] {
        let options = RenderOptions {
            mode,
            debug: true,
            interaction: Some(&handler),
            ..RenderOptions::default()
        };
        let _ = render(&s, &options);
    }
});
