use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ortho_geometry::{frames, Affine, Window};
use ortho_image::{DynImage, Image};
use ortho_rectify::{DifferentialRectification, DtmWindow, GridRectifier};

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn bench_grid_rectify(c: &mut Criterion) {
    let mut group = c.benchmark_group("GridRectify");

    for (size, spacing) in [(256, 8), (512, 8), (1024, 16)].iter() {
        group.throughput(criterion::Throughput::Elements((size * size) as u64));

        let parameter_string = format!("{size}x{size}/{spacing}m");

        // photo of `size` pixels seeing a `size` metres square at 1 m per pixel
        let half = *size as f64 / 2.0;
        let source: DynImage = Image::<u8>::new(
            [*size, *size].into(),
            3,
            (0..size * size * 3).map(|i| (i % 251) as u8).collect(),
        )
        .unwrap()
        .into();
        let projector = DifferentialRectification::new(IDENTITY, [0.0, 0.0, *size as f64], *size as f64);
        let pixel_to_photo = frames::pixel_to_photo([half, half]).unwrap();
        let bbox = Window::new([-half, -half], [half, half]);
        let ortho_to_terrain = frames::ortho_to_terrain(&bbox, 1.0).unwrap();

        // rolling terrain sampled every `spacing` metres
        let samples = size / spacing + 2;
        let elevations = (0..samples * samples)
            .map(|i| ((i % samples) as f32 * 0.3).sin() * 5.0)
            .collect::<Vec<_>>();
        let elevations = Image::<f32>::new([samples, samples].into(), 1, elevations).unwrap();
        let georeference = Affine::new(
            -half - *spacing as f64,
            half + *spacing as f64,
            *spacing as f64,
            -(*spacing as f64),
            0.0,
        )
        .unwrap();
        let dtm = DtmWindow::from_image(elevations.into(), georeference);

        let rectifier = GridRectifier::new(&projector, pixel_to_photo, ortho_to_terrain, &source);
        let mut ortho = DynImage::zeros(source.layout()).unwrap();

        group.bench_with_input(
            BenchmarkId::new("per_cell_homography", &parameter_string),
            &dtm,
            |b, dtm| b.iter(|| rectifier.rectify(black_box(dtm), black_box(&mut ortho))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_grid_rectify);
criterion_main!(benches);
