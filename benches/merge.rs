use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::{Mat4, Vec3};

use studcad::core::ModelConfig;
use studcad::mesh::{merge_meshes, MergeSource, Mesh};
use studcad::model::{Model, StepRange};
use studcad::part::{PartCatalog, PartInfo};

fn brick() -> Mesh {
    Mesh::box_mesh(Vec3::new(-40.0, -20.0, -24.0), Vec3::new(40.0, 20.0, 0.0), 16)
}

fn bench_merge(c: &mut Criterion, count: usize) {
    let mesh = brick();
    let sources: Vec<MergeSource> = (0..count)
        .map(|i| MergeSource {
            mesh: &mesh,
            transform: Mat4::from_translation(Vec3::new((i % 32) as f32 * 80.0, (i / 32) as f32 * 40.0, 0.0)),
            color: (i % 8) as u32,
        })
        .collect();

    c.bench_function(&format!("merge_{count}"), |b| {
        b.iter(|| merge_meshes(black_box(&sources)));
    });
}

fn bench_merge_256(c: &mut Criterion) {
    bench_merge(c, 256);
}

fn bench_merge_4096(c: &mut Criterion) {
    bench_merge(c, 4096);
}

fn populated_model(count: usize, compress: bool) -> Model {
    let catalog = PartCatalog::new();
    catalog.register(PartInfo::brick("3001.dat", "Brick 2 x 4", brick()));
    let config = ModelConfig {
        compress_checkpoints: compress,
        ..ModelConfig::default()
    };

    let mut model = Model::new("bench.ldr", Arc::new(catalog), config);
    for i in 0..count {
        let transform = Mat4::from_translation(Vec3::new(i as f32 * 80.0, 0.0, 0.0));
        let step = (i / 16) as u32 + 1;
        model
            .add_piece_by_name("3001.dat", 4, transform, StepRange::new(step))
            .expect("brick is registered");
    }
    model
}

fn bench_checkpoint(c: &mut Criterion) {
    let mut plain = populated_model(1000, false);
    c.bench_function("checkpoint_1000", |b| {
        b.iter(|| plain.save_checkpoint(black_box("Moving")));
    });

    let mut compressed = populated_model(1000, true);
    c.bench_function("checkpoint_1000_lz4", |b| {
        b.iter(|| compressed.save_checkpoint(black_box("Moving")));
    });
}

criterion_group!(
    benches,
    bench_merge_256,
    bench_merge_4096,
    bench_checkpoint,
);
criterion_main!(benches);
