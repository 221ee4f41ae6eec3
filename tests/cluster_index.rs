use std::{collections::HashSet, sync::Arc, thread};

use geo::{line_string, point, Geometry, Point};
use geotiles::{ClusterIndex, ClusterOptions, Error, Feature, FeatureId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value};

const WORLD: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

fn tile_of(lon: f64, lat: f64, z: u8) -> (u32, u32) {
    let z2 = f64::from(1u32 << z);
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / std::f64::consts::PI;
    (((lon / 360.0 + 0.5) * z2).floor() as u32, (y * z2).floor() as u32)
}

fn point_count(feature: &Feature) -> u64 {
    feature.properties.get("point_count").and_then(Value::as_u64).unwrap_or(1)
}

fn random_points(n: usize, seed: u64) -> Vec<Feature> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let p = point!(x: rng.random_range(-180.0..180.0), y: rng.random_range(-85.0..85.0));
            Feature::new(p).with_id(i as u64)
        })
        .collect()
}

#[test]
fn nearby_points_merge_at_low_zoom_only() {
    let features = [
        Feature::new(point!(x: 0.0001, y: -0.0001)),
        Feature::new(point!(x: 0.0008, y: -0.0001)),
    ];
    let index = ClusterIndex::new(&features, ClusterOptions::default()).unwrap();

    let tile = index.get_tile(0, 0, 0);
    assert_eq!(tile.features.len(), 1);
    let properties = &tile.features[0].properties;
    assert_eq!(properties["cluster"], json!(true));
    assert_eq!(properties["point_count"], json!(2));
    assert_eq!(properties["point_count_abbreviated"], json!(2));

    let (x, y) = tile_of(0.0001, -0.0001, 18);
    let tile = index.get_tile(18, x, y);
    assert_eq!(tile.features.len(), 2);
    assert!(tile.features.iter().all(|f| !f.properties.contains_key("cluster")));
}

#[test]
fn every_zoom_conserves_points() {
    let features = random_points(2000, 7);
    let options = ClusterOptions { max_zoom: 12, ..Default::default() };
    let index = ClusterIndex::new(&features, options).unwrap();

    for z in 0..=13 {
        let total = index.get_clusters(WORLD, z).iter().map(point_count).sum::<u64>();
        assert_eq!(total, 2000, "zoom {z}");
    }
}

#[test]
fn clusters_shrink_with_zoom() {
    let features = random_points(2000, 11);
    let index = ClusterIndex::new(&features, ClusterOptions::default()).unwrap();

    let counts = (0..=17).map(|z| index.get_clusters(WORLD, z).len()).collect::<Vec<_>>();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
    assert_eq!(counts[17], 2000);
}

#[test]
fn edge_columns_see_across_the_antimeridian() {
    let features = [
        Feature::new(point!(x: 179.0, y: 10.0)).with_id("east"),
        Feature::new(point!(x: -179.0, y: 10.0)).with_id("west"),
    ];
    let index = ClusterIndex::new(&features, ClusterOptions::default()).unwrap();

    let ids = |z: u8, x: u32| {
        let tile = index.get_tile(z, x, 0);
        tile.features.iter()
            .map(|f| (f.id.clone(), f.geometry.clone()))
            .collect::<Vec<_>>()
    };

    let world = ids(0, 0);
    assert_eq!(world.len(), 2);
    assert!(world.contains(&(Some(FeatureId::from("west")), Geometry::Point(Point::new(1, 242)))));
    assert!(world.contains(&(Some(FeatureId::from("east")), Geometry::Point(Point::new(511, 242)))));

    let left = ids(1, 0);
    assert_eq!(left.len(), 2);
    assert!(left.contains(&(Some(FeatureId::from("west")), Geometry::Point(Point::new(3, 483)))));
    assert!(left.contains(&(Some(FeatureId::from("east")), Geometry::Point(Point::new(-3, 483)))));

    let right = ids(1, 1);
    assert_eq!(right.len(), 2);
    assert!(right.contains(&(Some(FeatureId::from("east")), Geometry::Point(Point::new(509, 483)))));
    assert!(right.contains(&(Some(FeatureId::from("west")), Geometry::Point(Point::new(515, 483)))));
}

#[test]
fn antimeridian_bbox_is_split() {
    let features = [
        Feature::new(point!(x: 179.0, y: 0.0)),
        Feature::new(point!(x: -179.0, y: 0.0)),
        Feature::new(point!(x: 0.0, y: 0.0)),
    ];
    let index = ClusterIndex::new(&features, ClusterOptions::default()).unwrap();

    assert_eq!(index.get_clusters([170.0, -10.0, -170.0, 10.0], 17).len(), 2);
    assert_eq!(index.get_clusters([-10.0, -10.0, 10.0, 10.0], 17).len(), 1);
    assert_eq!(index.get_clusters([-540.0, -90.0, 540.0, 90.0], 17).len(), 3);
}

/// Twenty-five points a few metres apart, plus one far away.
fn tight_grid() -> Vec<Feature> {
    let mut features = (0..25u32)
        .map(|i| {
            let p = point!(x: 10.0 + f64::from(i % 5) * 0.001, y: 45.0 + f64::from(i / 5) * 0.001);
            Feature::new(p).with_id(u64::from(i))
        })
        .collect::<Vec<_>>();
    features.push(Feature::new(point!(x: -100.0, y: -30.0)).with_id(99u64));
    features
}

fn top_cluster(index: &ClusterIndex) -> u64 {
    let clusters = index.get_clusters([0.0, 40.0, 20.0, 50.0], 0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(point_count(&clusters[0]), 25);
    clusters[0].properties["cluster_id"].as_u64().unwrap()
}

#[test]
fn children_partition_the_cluster() {
    let index = ClusterIndex::new(&tight_grid(), ClusterOptions::default()).unwrap();
    let id = top_cluster(&index);

    let children = index.get_children(id).unwrap();
    assert!(children.len() > 1);
    assert_eq!(children.iter().map(point_count).sum::<u64>(), 25);
    for child in &children {
        assert!(matches!(child.geometry, Some(Geometry::Point(_))));
    }
}

#[test]
fn leaves_page_through_original_points() {
    let index = ClusterIndex::new(&tight_grid(), ClusterOptions::default()).unwrap();
    let id = top_cluster(&index);

    let leaf_ids = |limit, offset| {
        index.get_leaves(id, limit, offset).unwrap()
            .into_iter()
            .map(|f| f.id.unwrap())
            .collect::<Vec<_>>()
    };

    let all = leaf_ids(100, 0);
    assert_eq!(all.len(), 25);
    assert_eq!(all.iter().cloned().map(|id| id.to_string()).collect::<HashSet<_>>().len(), 25);
    assert!(!all.contains(&FeatureId::UInt(99)));

    assert_eq!(leaf_ids(10, 0), all[..10]);
    assert_eq!(leaf_ids(10, 20), all[20..]);
    assert!(leaf_ids(10, 25).is_empty());
    assert!(leaf_ids(0, 0).is_empty());
}

#[test]
fn expansion_zoom_is_where_the_cluster_splits() {
    let index = ClusterIndex::new(&tight_grid(), ClusterOptions::default()).unwrap();
    let id = top_cluster(&index);

    let zoom = index.get_cluster_expansion_zoom(id).unwrap();
    assert!((1..=17).contains(&zoom));

    let has_id = |z| index.get_clusters(WORLD, z)
        .iter()
        .any(|f| f.properties.get("cluster_id").and_then(Value::as_u64) == Some(id));
    assert!(has_id(zoom - 1));
    assert!(!has_id(zoom));
}

#[test]
fn unknown_cluster_id_is_an_error() {
    let index = ClusterIndex::new(&tight_grid(), ClusterOptions::default()).unwrap();
    assert!(matches!(index.get_children(3), Err(Error::ClusterNotFound(3))));
    assert!(matches!(index.get_leaves(123_456, 10, 0), Err(Error::ClusterNotFound(123_456))));
    assert!(index.get_cluster_expansion_zoom(1).is_err());
}

#[test]
fn generated_ids_are_input_indices() {
    let features = [
        Feature::new(geo::line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]),
        Feature::new(point!(x: 50.0, y: 50.0)).with_id("named"),
    ];
    let options = ClusterOptions { generate_id: true, ..Default::default() };
    let index = ClusterIndex::new(&features, options).unwrap();

    let (x, y) = tile_of(50.0, 50.0, 17);
    let tile = index.get_tile(17, x, y);
    assert_eq!(tile.features.len(), 1);
    assert_eq!(tile.features[0].id, Some(FeatureId::UInt(1)));
}

#[test]
fn inverted_zooms_are_rejected() {
    let options = ClusterOptions { min_zoom: 10, max_zoom: 5, ..Default::default() };
    assert!(matches!(ClusterIndex::new(&[], options), Err(Error::Config(_))));
}

#[test]
fn index_is_shared_across_threads() {
    let features = random_points(500, 3);
    let index = thread::spawn(move || ClusterIndex::new(&features, ClusterOptions::default()))
        .join()
        .unwrap()
        .unwrap();
    let index = Arc::new(index);
    let expected = index.get_tile(1, 1, 0);

    let handles = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || index.get_tile(1, 1, 0))
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
