//! Exercises the checked-in `.mca` fixtures under `test/` rather than
//! fixtures generated at run time, per §12.

use std::path::PathBuf;

use anvil_world::{CompoundExt, Region};

fn fixture(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn empty_region_fixture_has_no_chunks() {
    let region = Region::load(&fixture("test/empty_region.mca"), 0, 0).unwrap();
    assert!(region.list_chunks().is_empty());
    assert!(!region.has_chunk(0, 0));
}

#[test]
fn hand_built_region_fixture_decodes_its_known_chunks() {
    let region = Region::load(&fixture("test/region/r.0.0.mca"), 0, 0).unwrap();

    let mut chunks = region.list_chunks();
    chunks.sort();
    assert_eq!(chunks, vec![(0, 0), (1, 0)]);

    let a = region.read_chunk(0, 0).unwrap().unwrap();
    let a_level = a.get_compound_tag("Level").unwrap();
    assert_eq!(a_level.get_i32("xPos").unwrap(), 0);
    assert_eq!(a_level.get_i32("zPos").unwrap(), 0);

    let b = region.read_chunk(1, 0).unwrap().unwrap();
    let b_level = b.get_compound_tag("Level").unwrap();
    assert_eq!(b_level.get_i32("xPos").unwrap(), 1);
    assert_eq!(b_level.get_i32("zPos").unwrap(), 0);
}
