use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schematic_converter::{BlockState, SchematicConverter, SchematicDocument, SchematicFormat};

fn build_document(size: u32) -> SchematicDocument {
    let mut document = SchematicDocument::new((size, size, size)).unwrap();
    document.metadata.data_version = Some(3465);
    let blocks = [
        BlockState::new("minecraft:stone"),
        BlockState::new("minecraft:dirt"),
        BlockState::new("minecraft:oak_planks"),
        BlockState::new("minecraft:glass"),
    ];
    for x in 0..size as i32 {
        for y in 0..size as i32 {
            for z in 0..size as i32 {
                let block = &blocks[((x + y * 3 + z * 7) % 4) as usize];
                document.set_block(x, y, z, block.clone());
            }
        }
    }
    document
}

fn benchmark_document_creation(c: &mut Criterion) {
    c.bench_function("build 32^3 document", |b| {
        b.iter(|| build_document(black_box(32)))
    });
}

fn benchmark_encoding(c: &mut Criterion) {
    let converter = SchematicConverter::new();
    let document = build_document(64);
    for format in SchematicFormat::ALL {
        c.bench_function(&format!("encode 64^3 {}", format), |b| {
            b.iter(|| converter.encode(black_box(&document), format).unwrap())
        });
    }
}

fn benchmark_conversion(c: &mut Criterion) {
    let converter = SchematicConverter::new();
    let document = build_document(64);
    for from in SchematicFormat::ALL {
        let bytes = converter.encode(&document, from).unwrap().bytes;
        for to in SchematicFormat::ALL {
            c.bench_function(&format!("convert 64^3 {} -> {}", from, to), |b| {
                b.iter(|| converter.convert(black_box(&bytes), from, to).unwrap())
            });
        }
    }
}

criterion_group!(benches, benchmark_document_creation, benchmark_encoding, benchmark_conversion);
criterion_main!(benches);
