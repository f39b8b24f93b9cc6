#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either fail to parse or yield a consistent table
    if let Ok(index) = vvsearch::sprite::SpriteIndex::parse(data) {
        for loc in index.frames() {
            let range = index
                .locate(loc.key.folder_id, loc.key.frame_num)
                .expect("indexed key must be found");
            if let Some(end) = range.end {
                assert!(end >= range.start);
            }
        }
    }
});
