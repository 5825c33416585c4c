//! Field-level properties of the per-site strategies: no-data fallback,
//! exact reproduction at coincident sites, weight normalization and
//! deterministic ranking.


use densefield::strategy::blend_weights;
use densefield::transform::{RigidTransform, TranslationTransform};
use densefield::{
    rank_by_distance, CancelToken, CorrespondencePoint, FieldConfig, FieldError, FieldGenerator,
    Neighbor, OutputGridSpec, Point2, PointSet, Strategy, Transform, Vector2,
};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use test_data::{displacement_points, jittered_positions, square_grid, transform_points};

fn random_displacement_points(rng: &mut StdRng, count: usize, extent: f64) -> PointSet {
    (0..count)
        .map(|_| {
            let p = Point2::new(rng.random::<f64>() * extent, rng.random::<f64>() * extent);
            let d = Vector2::new(rng.random::<f64>() * 4.0 - 2.0, rng.random::<f64>() * 4.0 - 2.0);
            CorrespondencePoint::with_displacement(p, d, rng.random::<f64>())
        })
        .collect()
}

#[test]
fn test_no_valid_points_gives_default_everywhere() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

    let positions = jittered_positions(6, 4.0);
    let displacements = displacement_points(&positions, |p| Vector2::new(p.x * 0.1, -1.0));
    let rigid = transform_points(&positions, |_, _| {
        Transform::Rigid(RigidTransform::new(0.05, 1.0, 0.0, Point2::origin()))
    });
    let translations = transform_points(&positions, |_, _| {
        Transform::Translation(TranslationTransform::new(1.0, 2.0))
    });

    // Every metric is 1.0, so a threshold above it leaves nothing valid
    let config = FieldConfig {
        metric_threshold: 2.0,
        default_value: Vector2::new(7.0, -3.0),
        neighbor_count: 3,
        ..Default::default()
    };
    let grid = square_grid(12, 2.0);

    let cases: [(&PointSet, Strategy); 5] = [
        (&displacements, Strategy::NearestPoint),
        (&displacements, Strategy::NearestKLinearBlend),
        (&rigid, Strategy::NearestTransform),
        (&rigid, Strategy::NearestKTransformBlend),
        (&translations, Strategy::NearestKParameterBlend),
    ];
    for (points, strategy) in cases {
        let field = FieldGenerator::new(points, grid.clone(), config.clone(), strategy)
            .expect("valid configuration")
            .generate()
            .expect("generation succeeds");
        assert_eq!(field.no_data_sites(), grid.num_sites(), "{:?}", strategy);
        assert!(
            field.values().iter().all(|v| *v == config.default_value),
            "{:?} wrote a non-default value",
            strategy
        );
    }

    // Spline strategies have nothing to fit and refuse at configuration time
    for strategy in [Strategy::SplineDisplacement, Strategy::SplineTransform] {
        let err = FieldGenerator::new(&displacements, grid.clone(), config.clone(), strategy)
            .expect_err("spline fit needs valid points");
        assert!(matches!(
            err,
            FieldError::TooFewPointsForSpline { available: 0, .. }
        ));
        assert!(err.is_configuration());
    }
}

#[test]
fn test_single_neighbor_blend_is_bit_identical_to_nearest_point() {
    let mut rng = StdRng::seed_from_u64(42);
    let points = random_displacement_points(&mut rng, 60, 50.0);

    // North-up grid: negative y spacing
    let grid = OutputGridSpec::new(40, 30, Vector2::new(1.25, -1.5), Point2::new(-2.0, 48.0));
    let config = FieldConfig {
        metric_threshold: 0.3,
        neighbor_count: 1,
        ..Default::default()
    };

    let nearest = FieldGenerator::new(&points, grid.clone(), config.clone(), Strategy::NearestPoint)
        .expect("valid configuration")
        .generate()
        .expect("generation succeeds");
    let blended = FieldGenerator::new(&points, grid, config, Strategy::NearestKLinearBlend)
        .expect("valid configuration")
        .generate()
        .expect("generation succeeds");

    for (a, b) in nearest.values().iter().zip(blended.values()) {
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }
}

#[test]
fn test_blend_reproduces_point_value_at_coincident_site() -> anyhow::Result<()> {
    // Points placed exactly on grid sites
    let grid = square_grid(9, 1.0);
    let mut points = PointSet::new();
    let expected = [
        ((2, 3), Vector2::new(0.5, -0.25)),
        ((6, 6), Vector2::new(-1.75, 2.0)),
        ((4, 1), Vector2::new(3.0, 0.125)),
        ((0, 8), Vector2::new(-0.5, -0.5)),
    ];
    for ((col, row), d) in expected {
        points.push(CorrespondencePoint::with_displacement(
            grid.site_to_physical(col, row),
            d,
            1.0,
        ));
    }

    let config = FieldConfig {
        neighbor_count: 4,
        ..Default::default()
    };
    let field = FieldGenerator::new(&points, grid, config, Strategy::NearestKLinearBlend)?.generate()?;
    for ((col, row), d) in expected {
        assert_eq!(field.get(col, row), Some(d));
    }
    Ok(())
}

#[test]
fn test_transform_blend_reproduces_transform_at_coincident_site() -> anyhow::Result<()> {
    let grid = square_grid(8, 2.0);
    let t = Transform::Rigid(RigidTransform::new(0.3, 1.0, -2.0, Point2::new(6.0, 6.0)));
    let site = grid.site_to_physical(3, 3);
    let points: PointSet = vec![
        CorrespondencePoint::with_transform(site, t.clone(), 1.0),
        CorrespondencePoint::with_transform(
            Point2::new(0.0, 0.0),
            Transform::Translation(TranslationTransform::new(5.0, 5.0)),
            1.0,
        ),
        CorrespondencePoint::with_displacement(Point2::new(14.0, 0.0), Vector2::new(-4.0, 0.0), 1.0),
    ]
    .into_iter()
    .collect();

    let field = FieldGenerator::new(&points, grid, FieldConfig::default(), Strategy::NearestKTransformBlend)?
        .generate()?;
    let expected = t.transform_point(&site) - site;
    assert_eq!(field.get(3, 3), Some(expected));
    Ok(())
}

#[test]
fn test_blend_weights_are_normalized() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let count = 1 + (rng.random::<f64>() * 12.0) as usize;
        let mut neighbors: Vec<Neighbor> = (0..count)
            .map(|index| Neighbor {
                index,
                distance: rng.random::<f64>() * 100.0,
            })
            .collect();
        rank_by_distance(&mut neighbors);

        let weights = blend_weights(&neighbors);
        assert_eq!(weights.len(), count);
        assert!(weights.iter().all(|w| *w >= 0.0));
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {}", total);
        // Closer neighbors never get less weight
        for pair in weights.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }
}

#[test]
fn test_ranking_ignores_candidate_order() {
    let mut rng = StdRng::seed_from_u64(2024);
    // Few distinct distances, so ties are common
    let reference: Vec<Neighbor> = {
        let mut v: Vec<Neighbor> = (0..40)
            .map(|index| Neighbor {
                index,
                distance: (rng.random::<f64>() * 5.0).floor(),
            })
            .collect();
        rank_by_distance(&mut v);
        v
    };

    for _ in 0..20 {
        let mut keyed: Vec<(u64, Neighbor)> = reference
            .iter()
            .map(|n| (rng.random::<u64>(), *n))
            .collect();
        keyed.sort_by_key(|(k, _)| *k);
        let mut shuffled: Vec<Neighbor> = keyed.into_iter().map(|(_, n)| n).collect();
        rank_by_distance(&mut shuffled);
        assert_eq!(shuffled, reference);
    }

    for pair in reference.windows(2) {
        if pair[0].distance == pair[1].distance {
            assert!(pair[0].index < pair[1].index);
        }
    }
}

#[test]
fn test_equidistant_neighbors_resolve_by_insertion_order() -> anyhow::Result<()> {
    // Two points symmetric about the single site at x = 5
    let points: PointSet = vec![
        CorrespondencePoint::with_displacement(Point2::new(7.0, 0.0), Vector2::new(2.0, 0.0), 1.0),
        CorrespondencePoint::with_displacement(Point2::new(3.0, 0.0), Vector2::new(-2.0, 0.0), 1.0),
    ]
    .into_iter()
    .collect();
    let grid = OutputGridSpec::new(1, 1, Vector2::new(1.0, 1.0), Point2::new(5.0, 0.0));
    let field = FieldGenerator::new(&points, grid, FieldConfig::default(), Strategy::NearestPoint)?
        .generate()?;
    assert_eq!(field.get(0, 0), Some(Vector2::new(2.0, 0.0)));
    Ok(())
}

#[test]
fn test_repeated_generation_is_identical() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(99);
    let points = random_displacement_points(&mut rng, 80, 64.0);
    let grid = square_grid(64, 1.0);

    for strategy in [Strategy::NearestPoint, Strategy::NearestKLinearBlend] {
        let config = FieldConfig {
            neighbor_count: 5,
            tile_rows: 7,
            ..Default::default()
        };
        let generator = FieldGenerator::new(&points, grid.clone(), config, strategy)?;
        let first = generator.generate()?;
        for _ in 0..3 {
            assert_eq!(generator.generate()?, first);
        }
    }
    Ok(())
}

#[test]
fn test_grid_geometry_and_bands() -> anyhow::Result<()> {
    let grid = OutputGridSpec::new(5, 3, Vector2::new(2.0, -0.5), Point2::new(10.0, 20.0));
    assert_eq!(grid.site_to_physical(0, 0), Point2::new(10.0, 20.0));
    assert_eq!(grid.site_to_physical(4, 2), Point2::new(18.0, 19.0));
    let (lo, hi) = grid.physical_bounds();
    assert_eq!(lo, Point2::new(10.0, 19.0));
    assert_eq!(hi, Point2::new(18.0, 20.0));

    // A single point with a constant displacement fills the grid with it
    let points: PointSet = vec![CorrespondencePoint::with_displacement(
        Point2::new(0.0, 0.0),
        Vector2::new(1.0, -2.0),
        1.0,
    )]
    .into_iter()
    .collect();
    let field = FieldGenerator::new(&points, grid, FieldConfig::default(), Strategy::NearestPoint)?
        .generate()?;
    assert_eq!(field.width(), 5);
    assert_eq!(field.height(), 3);
    assert_eq!(field.row(2).len(), 5);

    let (dx, dy) = field.to_bands();
    assert_eq!(dx.len(), 15);
    assert!(dx.iter().all(|v| *v == 1.0));
    assert!(dy.iter().all(|v| *v == -2.0));
    Ok(())
}

#[test]
fn test_cancel_between_tiles_stops_the_run() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

    let mut rng = StdRng::seed_from_u64(5);
    let points = random_displacement_points(&mut rng, 40, 32.0);
    // One row per tile, far more tiles than pool threads
    let grid = OutputGridSpec::new(8, 2000, Vector2::new(1.0, 0.05), Point2::origin());
    let config = FieldConfig {
        tile_rows: 1,
        neighbor_count: 3,
        ..Default::default()
    };
    let generator = FieldGenerator::new(&points, grid, config, Strategy::NearestKLinearBlend)?;

    let cancel = CancelToken::new();
    let result = generator.generate_with_progress(&cancel, |done, _| {
        if done >= 3 {
            cancel.cancel();
        }
    });
    match result {
        Err(FieldError::Cancelled {
            completed_tiles,
            total_tiles,
        }) => {
            assert_eq!(total_tiles, 2000);
            assert!(completed_tiles >= 3, "completed {}", completed_tiles);
            assert!(completed_tiles < total_tiles);
        }
        other => panic!("expected a cancelled run, got {:?}", other.map(|f| f.no_data_sites())),
    }

    // The generator is reusable with a fresh token
    let field = generator.generate_with_cancel(&CancelToken::new())?;
    assert_eq!(field.values().len(), 16_000);
    Ok(())
}

#[test]
fn test_parameter_blend_of_translations_matches_point_blend() -> anyhow::Result<()> {
    let positions = jittered_positions(8, 6.0);
    let points = transform_points(&positions, |k, p| {
        Transform::Translation(TranslationTransform::new(0.1 * p.x, k as f64 * 0.01))
    });
    let grid = square_grid(24, 2.0);
    let config = FieldConfig {
        neighbor_count: 4,
        ..Default::default()
    };

    let params = FieldGenerator::new(&points, grid.clone(), config.clone(), Strategy::NearestKParameterBlend)?
        .generate()?;
    let displaced = FieldGenerator::new(&points, grid, config, Strategy::NearestKTransformBlend)?.generate()?;
    assert_eq!(params.no_data_sites(), 0);
    for (a, b) in params.values().iter().zip(displaced.values()) {
        assert!((a - b).norm() < 1e-9, "{:?} vs {:?}", a, b);
    }
    Ok(())
}
