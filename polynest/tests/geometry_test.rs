mod common;

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use polynest::geometry::clip;
    use polynest::geometry::convex_hull::convex_hull_of;
    use polynest::geometry::primitives::{Contour, Point};
    use polynest::geometry::simplification::{SimplifyConfig, simplify};

    use crate::common::{init_logger, square, square_at};

    const CT: f64 = 0.3;

    fn bowtie() -> Contour {
        Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(4.0, 4.0),
        ])
    }

    fn pinched() -> Contour {
        Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, -5.0),
        ])
    }

    /// 48-gon around a radius-5 disc with alternating radial jags well below
    /// the working tolerance, so the reduction has something to remove.
    fn jagged_disc() -> Contour {
        let n = 48;
        (0..n)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / n as f64;
                let r = match i % 2 {
                    0 => 5.15,
                    _ => 4.85,
                };
                Point::new(r * angle.cos(), r * angle.sin())
            })
            .collect()
    }

    fn l_shape() -> Contour {
        Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 4.0),
            Point::new(0.0, 4.0),
        ])
    }

    fn boundary_distance(p: Point, contour: &Contour) -> f64 {
        contour
            .edges()
            .fold(f64::INFINITY, |acc, (a, b)| {
                acc.min(p.sq_distance_to_segment(&a, &b))
            })
            .sqrt()
    }

    #[test_case(super::bowtie(); "bowtie")]
    #[test_case(super::pinched(); "pinched")]
    fn clean_resolves_self_intersection_within_hull(contour: Contour) {
        init_logger();
        let hull = convex_hull_of(&contour).unwrap();
        let cleaned = clip::clean(&contour, CT).unwrap();
        assert!(cleaned.area() > 0.0);
        assert!(cleaned.area() <= hull.area() + 1e-6);
    }

    #[test]
    fn clean_rejects_degenerate_input() {
        init_logger();
        let line = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ]);
        assert!(clip::clean(&line, CT).is_none());

        let segment = Contour::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(clip::clean(&segment, CT).is_none());
    }

    #[test]
    fn clean_strips_collinear_and_closing_vertices() {
        init_logger();
        let noisy = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ]);
        let cleaned = clip::clean(&noisy, CT).unwrap();
        assert_eq!(cleaned.len(), 4);
        assert!((cleaned.area() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn offset_round_trip_recovers_area() {
        init_logger();
        let original = Contour::new(square(10.0));
        let grown = clip::offset(&original, 1.0);
        assert_eq!(grown.len(), 1);
        assert!((grown[0].signed_area() - 144.0).abs() < 1e-3);

        let back = clip::offset(&grown[0], -1.0);
        assert_eq!(back.len(), 1);
        assert!((back[0].signed_area() - original.signed_area()).abs() < 1e-3);
    }

    #[test]
    fn offset_zero_is_identity() {
        let original = Contour::new(square(10.0));
        assert_eq!(clip::offset(&original, 0.0), vec![original]);
    }

    #[test]
    fn offset_may_split_into_disjoint_rings() {
        init_logger();
        // two 4x4 squares joined by a 0.2 wide bridge; insetting by 0.5
        // removes the bridge
        let dumbbell = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 1.9),
            Point::new(8.0, 1.9),
            Point::new(8.0, 0.0),
            Point::new(12.0, 0.0),
            Point::new(12.0, 4.0),
            Point::new(8.0, 4.0),
            Point::new(8.0, 2.1),
            Point::new(4.0, 2.1),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]);
        let rings = clip::offset(&dumbbell, -0.5);
        assert_eq!(rings.len(), 2);
        for ring in &rings {
            assert!((ring.area() - 9.0).abs() < 1e-3);
        }
    }

    #[test]
    fn simplify_outside_bias_never_dips_inside() {
        init_logger();
        let original = jagged_disc();
        let cfg = SimplifyConfig {
            curve_tolerance: CT,
            hull_only: false,
        };
        let result = simplify(&original, false, &cfg);
        assert!(result.contour.len() < original.len());
        for &v in result.contour.iter() {
            let strictly_inside =
                clip::point_in_contour(v, &original) && boundary_distance(v, &original) > 0.01;
            assert!(!strictly_inside, "vertex {v:?} lies inside the original");
        }
    }

    #[test]
    fn simplify_inside_bias_never_pokes_outside() {
        init_logger();
        let original = jagged_disc();
        let cfg = SimplifyConfig {
            curve_tolerance: CT,
            hull_only: false,
        };
        let result = simplify(&original, true, &cfg);
        assert!(result.contour.len() >= 3);
        for &v in result.contour.iter() {
            let inside_or_on =
                clip::point_in_contour(v, &original) || boundary_distance(v, &original) < 0.01;
            assert!(inside_or_on, "vertex {v:?} lies outside the original");
        }
    }

    #[test]
    fn simplify_pulls_back_to_the_nearest_accepted_shell() {
        init_logger();
        // square with a shallow spike hanging off the bottom-left corner;
        // the reduction removes the spike, so pulling the corrected corner
        // all the way back onto (0, 0) would strand the spike outside while
        // every intermediate shell still admits it
        let spiked = Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.5, -0.2),
            Point::new(8.0, 0.0),
            Point::new(8.0, 8.0),
            Point::new(0.0, 8.0),
        ]);
        let cfg = SimplifyConfig {
            curve_tolerance: CT,
            hull_only: false,
        };
        let result = simplify(&spiked, false, &cfg);
        assert_eq!(result.contour.len(), 4);
        assert!(clip::point_in_contour(Point::new(0.5, -0.2), &result.contour));

        let corner = |scale: f64| Point::new(-scale * CT, -scale * CT);
        let relocated = |p: Point| result.contour.iter().any(|v| v.within_distance(&p, 1e-9));
        assert!(relocated(corner(1.0)), "nearest shell did not win");
        assert!(!relocated(Point::new(0.0, 0.0)));
        assert!(!relocated(corner(2.0)));
        assert!(!relocated(corner(3.0)));
    }

    #[test]
    fn simplify_hull_mode_returns_convex_hull() {
        init_logger();
        let cfg = SimplifyConfig {
            curve_tolerance: CT,
            hull_only: true,
        };
        let result = simplify(&l_shape(), false, &cfg);
        assert_eq!(result.contour.len(), 5);
        assert!((result.contour.signed_area() - 14.0).abs() < 1e-9);
        assert!(result.holes.is_empty());
    }

    #[test_case(Point::new(5.0, 5.0), true; "center")]
    #[test_case(Point::new(0.0, 0.0), false; "vertex")]
    #[test_case(Point::new(5.0, 0.0), false; "edge midpoint")]
    #[test_case(Point::new(15.0, 5.0), false; "outside")]
    fn point_in_contour_excludes_boundary(point: Point, expected: bool) {
        let contour = Contour::new(square(10.0));
        assert_eq!(clip::point_in_contour(point, &contour), expected);
    }

    #[test]
    fn union_keeps_largest_component() {
        init_logger();
        let a = Contour::new(square(10.0));
        let b = Contour::new(square_at(5.0, 0.0, 10.0));
        let merged = clip::union_max_area(&a, &b).unwrap();
        assert!((merged.signed_area() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn convex_hull_of_concave_shape() {
        let hull = convex_hull_of(&l_shape()).unwrap();
        assert_eq!(hull.len(), 5);
        assert!(hull.signed_area() > 0.0);
        assert!((hull.area() - 14.0).abs() < 1e-9);
    }
}
