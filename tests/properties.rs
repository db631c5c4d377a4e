use proptest::prelude::*;
use schematic_converter::{
    BlockState, ErrorKind, SchematicConverter, SchematicDocument, SchematicFormat, Stage,
};

fn format_strategy() -> impl Strategy<Value = SchematicFormat> {
    prop_oneof![
        Just(SchematicFormat::Litematic),
        Just(SchematicFormat::Schematic),
        Just(SchematicFormat::Schem),
    ]
}

fn sample_bytes(format: SchematicFormat) -> Vec<u8> {
    let mut document = SchematicDocument::new((3, 3, 3)).unwrap();
    document.metadata.data_version = Some(3465);
    document.set_block(0, 0, 0, BlockState::new("minecraft:stone"));
    document.set_block(1, 2, 1, BlockState::new("minecraft:dirt"));
    document.set_block(2, 1, 0, BlockState::new("minecraft:glass"));
    SchematicConverter::new().encode(&document, format).unwrap().bytes
}

const STONE: &str = "minecraft:stone";
const PLANKS: &str = "minecraft:oak_planks";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn truncated_input_is_malformed(format in format_strategy(), cut in 0.0f64..1.0) {
        let bytes = sample_bytes(format);
        let len = ((bytes.len() as f64) * cut) as usize;
        let error = SchematicConverter::new()
            .convert(&bytes[..len], format, SchematicFormat::Schem)
            .unwrap_err();
        prop_assert_eq!(error.kind(), ErrorKind::Malformed);
        prop_assert_eq!(error.stage(), Some(Stage::Decode));
    }

    #[test]
    fn corrupted_input_is_malformed(format in format_strategy(), at in 10usize..4096) {
        let mut bytes = sample_bytes(format);
        let index = 10 + at % (bytes.len() - 10);
        bytes[index] ^= 0xFF;
        let error = SchematicConverter::new()
            .convert(&bytes, format, SchematicFormat::Litematic)
            .unwrap_err();
        prop_assert_eq!(error.kind(), ErrorKind::Malformed);
        prop_assert_eq!(error.stage(), Some(Stage::Decode));
    }

    #[test]
    fn random_grids_survive_every_format(
        from in format_strategy(),
        to in format_strategy(),
        cells in proptest::collection::vec(any::<bool>(), 2 * 3 * 4),
    ) {
        let mut document = SchematicDocument::new((2, 3, 4)).unwrap();
        document.metadata.data_version = Some(3465);
        for (i, &planks) in cells.iter().enumerate() {
            let (x, z, y) = ((i % 2) as i32, ((i / 2) % 4) as i32, (i / 8) as i32);
            document.set_block(x, y, z, BlockState::new(if planks { PLANKS } else { STONE }));
        }

        let converter = SchematicConverter::new();
        let input = converter.encode(&document, from).unwrap().bytes;
        let output = converter.convert(&input, from, to).unwrap();
        let (decoded, _) = converter.decode(&output.bytes, to).unwrap();
        prop_assert_eq!(decoded, document);
    }
}
