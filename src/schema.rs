//! Tag schema tables: which names are allowed in a `level.dat` or chunk
//! document, and what type each one must carry. Grounded on the reference
//! implementation's `leveldat_tags`/`chunk_tags` arrays — a single flat
//! table per document root, consulted at every nesting depth, rather than
//! a schema scoped per-compound. Unknown keys and type mismatches are
//! rejected at encode time; decode never consults a schema at all (§4.2).

use crate::nbt::value::TagId;

/// One recognized name in a [`Schema`]: its expected wire type, and (for
/// `List` entries) the element type list items must carry.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub name: &'static str,
    pub id: TagId,
    pub list_element: Option<TagId>,
    /// `Entities` and `TileEntities` are serialized as a zero-length
    /// `TAG_Byte_Array` when empty instead of an empty `TAG_List` — a
    /// quirk of the reference writer this crate reproduces so that a
    /// round-tripped empty chunk stays byte-identical.
    pub empty_list_as_byte_array: bool,
}

const fn entry(name: &'static str, id: TagId) -> SchemaEntry {
    SchemaEntry {
        name,
        id,
        list_element: None,
        empty_list_as_byte_array: false,
    }
}

const fn list_entry(name: &'static str, element: TagId) -> SchemaEntry {
    SchemaEntry {
        name,
        id: TagId::List,
        list_element: Some(element),
        empty_list_as_byte_array: false,
    }
}

const fn list_entry_quirky(name: &'static str, element: TagId) -> SchemaEntry {
    SchemaEntry {
        name,
        id: TagId::List,
        list_element: Some(element),
        empty_list_as_byte_array: true,
    }
}

/// A flat, read-only table of recognized tag names for one document root.
/// Shared (via cheap `Vec` clone or a fresh call to the constructor
/// function) between every nesting level of that document — a `Sections`
/// entry's inner compounds are checked against the very same table as the
/// document root, matching the reference implementation.
pub struct Schema {
    entries: Vec<SchemaEntry>,
}

impl Schema {
    fn new(entries: Vec<SchemaEntry>) -> Self {
        Schema { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// The `level.dat` schema: the root `Data` compound plus every key the
/// reference implementation's `leveldat_tags` table recognizes, including
/// the enumerated `GameRules` boolean-as-string fields.
pub fn leveldat_schema() -> Schema {
    Schema::new(vec![
        entry("Data", TagId::Compound),
        entry("version", TagId::Int),
        entry("initialized", TagId::Byte),
        entry("LevelName", TagId::String),
        entry("generatorName", TagId::String),
        entry("generatorVersion", TagId::Int),
        entry("generatorOptions", TagId::String),
        entry("RandomSeed", TagId::Long),
        entry("MapFeatures", TagId::Byte),
        entry("LastPlayed", TagId::Long),
        entry("SizeOnDisk", TagId::Long),
        entry("allowCommands", TagId::Byte),
        entry("hardcore", TagId::Byte),
        entry("GameType", TagId::Int),
        entry("Time", TagId::Long),
        entry("DayTime", TagId::Long),
        entry("SpawnX", TagId::Int),
        entry("SpawnY", TagId::Int),
        entry("SpawnZ", TagId::Int),
        entry("raining", TagId::Byte),
        entry("rainTime", TagId::Int),
        entry("thundering", TagId::Byte),
        entry("thunderTime", TagId::Int),
        entry("Player", TagId::Compound),
        entry("GameRules", TagId::Compound),
        entry("commandBlockOutput", TagId::String),
        entry("doFireTick", TagId::String),
        entry("doMobLoot", TagId::String),
        entry("doMobSpawning", TagId::String),
        entry("doTileDrops", TagId::String),
        entry("keepInventory", TagId::String),
        entry("mobGriefing", TagId::String),
    ])
}

/// The chunk root schema: the `Level` compound and its block-storage,
/// entity, and tick-list fields. Carries both the pre-flattening
/// `Blocks`/`Data`/`Add` byte-and-nibble-array layout and the modern
/// palette-based `Biomes`/`Palette`/`BlockStates` fields named in §4.3 —
/// a schema lookup failure is reserved for a genuinely unrecognized tag,
/// not for every save produced by a newer client.
pub fn chunk_schema() -> Schema {
    Schema::new(vec![
        entry("Level", TagId::Compound),
        entry("xPos", TagId::Int),
        entry("zPos", TagId::Int),
        entry("LastUpdate", TagId::Long),
        entry("LightPopulated", TagId::Byte),
        entry("TerrainPopulated", TagId::Byte),
        entry("InhabitedTime", TagId::Long),
        entry("Biomes", TagId::ByteArray),
        entry("HeightMap", TagId::IntArray),
        list_entry("Sections", TagId::Compound),
        list_entry_quirky("Entities", TagId::Compound),
        list_entry_quirky("TileEntities", TagId::Compound),
        list_entry("TileTicks", TagId::Compound),
        // Section compound fields (validated against this same flat
        // table, per the reference implementation).
        entry("Y", TagId::Byte),
        entry("Blocks", TagId::ByteArray),
        entry("Add", TagId::ByteArray),
        entry("Data", TagId::ByteArray),
        entry("BlockLight", TagId::ByteArray),
        entry("SkyLight", TagId::ByteArray),
        list_entry("Palette", TagId::Compound),
        entry("BlockStates", TagId::LongArray),
        // Palette entry fields (block-state names, 1.13+ saves).
        entry("Name", TagId::String),
        entry("Properties", TagId::Compound),
        // TileTicks entry fields.
        entry("i", TagId::String),
        entry("t", TagId::Int),
        entry("p", TagId::Int),
        entry("x", TagId::Int),
        entry("y", TagId::Int),
        entry("z", TagId::Int),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leveldat_schema_knows_spawn_coordinates() {
        let schema = leveldat_schema();
        let spawn_x = schema.lookup("SpawnX").unwrap();
        assert_eq!(spawn_x.id, TagId::Int);
    }

    #[test]
    fn chunk_schema_flags_entities_quirk() {
        let schema = chunk_schema();
        let entities = schema.lookup("Entities").unwrap();
        assert!(entities.empty_list_as_byte_array);
        let sections = schema.lookup("Sections").unwrap();
        assert!(!sections.empty_list_as_byte_array);
    }

    #[test]
    fn unknown_name_is_not_in_either_schema() {
        assert!(leveldat_schema().lookup("NotARealKey").is_none());
        assert!(chunk_schema().lookup("NotARealKey").is_none());
    }
}
