use std::sync::mpsc::channel;

use mandeltile::bench::{Benchmark, BenchmarkReport};
use mandeltile::encode::encode_png;
use mandeltile::{c, Aggregator, Dimension, GreyscalePainter, Region, TileResult};

const REPEATS: usize = 5;

fn tiles(size: u32, tile_edge: u32) -> (Region, Vec<Region>, Vec<TileResult>) {
    let region =
        Region::create(Dimension::new(size, size), c(-2.0, -2.0), c(2.0, 2.0), 1024).unwrap();
    let parts = region.split(tile_edge).unwrap();
    let results = parts
        .iter()
        .map(|p| TileResult::new(p.clone(), (0..p.size().area() as u32).collect()))
        .collect();
    (region, parts, results)
}

fn bench_assemble(size: u32, tile_edge: u32, encode: bool) -> Benchmark {
    let name = &format!("assemble r={}x{} d={} png={}", size, size, tile_edge, encode);
    let (region, parts, results) = tiles(size, tile_edge);
    Benchmark::iter(name, REPEATS, move || {
        let (tx, rx) = channel();
        for result in &results {
            tx.send(Ok(result.clone())).unwrap();
        }
        let canvas = Aggregator::new(region.size(), &parts, GreyscalePainter)
            .collect(&rx)
            .unwrap();
        if encode {
            encode_png(&canvas).unwrap();
        }
    })
}

fn main() {
    BenchmarkReport::with_benches(vec![
        bench_assemble(1000, 1000, false),
        bench_assemble(1000, 100, false),
        bench_assemble(1000, 100, true),
        bench_assemble(2000, 250, false),
        bench_assemble(2000, 250, true),
    ])
    .report("assemble")
    .expect("failed to write benchmark report");
}
