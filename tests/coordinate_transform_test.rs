use knowledge_connector::geo::{ntm_from_wgs84, Wgs84Coord};

#[test]
fn test_origin_maps_to_zero() {
    let origin = Wgs84Coord::new(59.91, 10.75);
    let ntm = ntm_from_wgs84(&origin, &origin).expect("origin should project");
    assert_eq!(ntm.northing, 0.0);
    assert_eq!(ntm.easting, 0.0);
}

#[test]
fn test_point_ten_degrees_from_meridian() {
    let origin = Wgs84Coord::new(60.0, 10.0);
    let point = Wgs84Coord::new(60.5, 20.0);

    let ntm = ntm_from_wgs84(&origin, &point).expect("10 degrees off the meridian should project");
    assert!(ntm.easting.is_finite() && ntm.northing.is_finite());
    assert!(ntm.easting > 0.0 && ntm.easting < 1_000_000.0, "easting was {}", ntm.easting);
    assert!(ntm.northing > 0.0 && ntm.northing < 9_600_000.0, "northing was {}", ntm.northing);
    // Roughly 10 degrees of longitude at 60.5 degrees north.
    assert!((ntm.easting - 549_000.0).abs() < 10_000.0, "easting was {}", ntm.easting);
}

#[test]
fn test_point_eighty_degrees_from_meridian() {
    let origin = Wgs84Coord::new(60.0, 10.0);
    let point = Wgs84Coord::new(60.0, 90.0);
    assert!(ntm_from_wgs84(&origin, &point).is_none());

    // Across the antimeridian the difference wraps around.
    let origin = Wgs84Coord::new(0.0, 170.0);
    let point = Wgs84Coord::new(0.0, -110.0);
    assert!(ntm_from_wgs84(&origin, &point).is_none());
    let point = Wgs84Coord::new(0.0, -175.0);
    assert!(ntm_from_wgs84(&origin, &point).is_some());
}

#[test]
fn test_out_of_range_input() {
    let origin = Wgs84Coord::new(0.0, 0.0);
    assert!(ntm_from_wgs84(&origin, &Wgs84Coord::new(91.0, 0.0)).is_none());
    assert!(ntm_from_wgs84(&origin, &Wgs84Coord::new(0.0, 180.0)).is_none());
    assert!(ntm_from_wgs84(&Wgs84Coord::new(0.0, 200.0), &origin).is_none());
}

#[test]
fn test_northing_grows_towards_pole() {
    let origin = Wgs84Coord::new(59.0, 10.0);
    let south = ntm_from_wgs84(&origin, &Wgs84Coord::new(58.5, 10.0)).unwrap();
    let north = ntm_from_wgs84(&origin, &Wgs84Coord::new(59.5, 10.0)).unwrap();
    assert!(south.northing < 0.0);
    assert!(north.northing > 0.0);
    // Half a degree of latitude is about 55.7 km.
    assert!((north.northing - 55_700.0).abs() < 300.0, "northing was {}", north.northing);
}
