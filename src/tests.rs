#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::num::NonZero;

    use unordered_pair::UnorderedPair;

    use crate::canon;
    use crate::codec;
    use crate::cover::{CoverSearch, PairTable, SearchPolicy, Shape, Witness, WorkerCtx};
    use crate::dispatch;
    use crate::embed;
    use crate::family::FamilySource;
    use crate::generate::CandidateGenerator;
    use crate::graph::{EdgeTable, Graph};
    use crate::maximal;
    use crate::polyiamond;
    use crate::prefix;
    use crate::sat::{self, CompletionProblem};
    use crate::spiral::{self, build_spiral};

    fn triangle(table: &EdgeTable) -> Graph {
        Graph::from_edges(table, [(0, 1), (1, 2), (0, 2)])
    }

    // K4 minus the (0, 3) edge: two unit triangles glued along (1, 2)
    fn diamond(table: &EdgeTable) -> Graph {
        Graph::from_edges(table, [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)])
    }

    fn path4(table: &EdgeTable) -> Graph {
        Graph::from_edges(table, [(0, 1), (1, 2), (2, 3)])
    }

    fn star4(table: &EdgeTable) -> Graph {
        Graph::from_edges(table, [(0, 1), (0, 2), (0, 3)])
    }

    fn two_workers() -> NonZero<usize> {
        NonZero::new(2).unwrap()
    }

    #[test]
    fn edge_ids_follow_the_row_major_formula() {
        let table = EdgeTable::new(5);
        assert_eq!(table.num_edges(), 10);
        for i in 0..5 {
            for j in (i + 1)..5 {
                let expected = i * (2 * 5 - i - 1) / 2 + (j - i - 1);
                assert_eq!(table.edge_id(i, j), expected);
                assert_eq!(table.edge_id(j, i), expected);
                assert_eq!(table.endpoints(expected), (i, j));
            }
        }
    }

    #[test]
    fn structural_queries() {
        let table = EdgeTable::new(4);

        let tri = Graph::from_edges(&table, [(0, 1), (1, 2), (0, 2)]);
        assert_eq!(tri.degrees(&table), vec![2, 2, 2, 0]);
        assert!(tri.has_isolated_vertex(&table));
        assert!(!tri.is_connected(&table));
        assert!(!tri.has_k4(&table));

        let p4 = path4(&table);
        assert!(p4.is_connected(&table));
        assert_eq!(p4.max_degree(&table), 2);

        let k4 = Graph::from_edges(&table, [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert!(k4.has_k4(&table));
        assert!(!diamond(&table).has_k4(&table));

        assert!(!Graph::empty().is_connected(&table));
    }

    #[test]
    fn relabeling_moves_edges() {
        let table = EdgeTable::new(3);
        let path = Graph::from_edges(&table, [(0, 1), (1, 2)]);
        // 0 -> 2, 1 -> 0, 2 -> 1: center moves to vertex 0
        let relabeled = path.relabeled(&table, &[2, 0, 1]);
        assert_eq!(relabeled, Graph::from_edges(&table, [(0, 2), (0, 1)]));
    }

    #[test]
    fn graph6_known_encoding() {
        let table = EdgeTable::new(3);
        let encoded = codec::encode_graph6(&table, &triangle(&table));
        assert_eq!(encoded, "Bw");
        assert_eq!(codec::decode_graph6(&table, "Bw").unwrap(), triangle(&table));
    }

    #[test]
    fn graph6_round_trips() {
        let table = EdgeTable::new(7);
        let spiral_graph = build_spiral(7).graph(&table);
        for g in [spiral_graph, Graph::from_edges(&table, [(0, 6), (2, 5)])] {
            let line = codec::encode_graph6(&table, &g);
            assert_eq!(codec::decode_graph6(&table, &line).unwrap(), g);
        }
    }

    #[test]
    fn graph6_reader_skips_bad_records() {
        let table = EdgeTable::new(3);
        // a K3, a record on 4 vertices, and garbage below the value range
        let input = "Bw\nC~\n#!\n\n";
        let (graphs, skipped) = codec::read_graph6_lines(&table, Cursor::new(input)).unwrap();
        assert_eq!(graphs, vec![triangle(&table)]);
        assert_eq!(skipped.wrong_order, 1);
        assert_eq!(skipped.malformed, 1);
    }

    #[test]
    fn binary_records_round_trip() {
        let narrow = EdgeTable::new(5);
        assert_eq!(codec::record_width(&narrow).unwrap(), 4);
        let wide = EdgeTable::new(13);
        assert_eq!(codec::record_width(&wide).unwrap(), 8);
        assert!(codec::record_width(&EdgeTable::new(20)).is_err());

        let graphs = vec![
            Graph::from_edges(&wide, [(0, 12), (3, 7)]),
            Graph::from_edges(&wide, [(1, 2)]),
        ];
        let mut buf = Vec::new();
        codec::write_records(&wide, &mut buf, &graphs).unwrap();
        assert_eq!(buf.len(), 16);
        let decoded = codec::read_records(&wide, &mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, graphs);
    }

    #[test]
    fn grouped_stream_round_trips() {
        let table = EdgeTable::new(5);
        let groups = vec![
            vec![triangle(&table), path4(&table)],
            vec![Graph::from_edges(&table, [(2, 4)])],
        ];
        let mut buf = Vec::new();
        codec::write_grouped(&table, &mut buf, &groups).unwrap();
        let decoded = codec::read_grouped(&table, &mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, groups);
    }

    #[test]
    fn generator_finds_the_spanning_trees_of_k4() {
        let table = EdgeTable::new(4);
        let candidates: Vec<Graph> = CandidateGenerator::new(&table, 3).collect();
        // connected 3-edge graphs on 4 labeled vertices are exactly the
        // spanning trees, 4^2 by Cayley
        assert_eq!(candidates.len(), 16);
        for g in &candidates {
            assert!(g.is_connected(&table));
            assert!(!g.has_isolated_vertex(&table));
        }
    }

    #[test]
    fn generator_rejects_k4() {
        let table = EdgeTable::new(4);
        let candidates: Vec<Graph> = CandidateGenerator::new(&table, 6).collect();
        assert!(candidates.is_empty());
        let mut gen = CandidateGenerator::new(&table, 3);
        gen.by_ref().for_each(drop);
        assert_eq!(gen.checked(), 20);
    }

    #[test]
    fn canonical_form_is_a_relabeling_invariant() {
        let table = EdgeTable::new(4);
        let g = path4(&table);
        let canonical = canon::canonical_form(&table, &g);

        assert_eq!(canon::canonical_form(&table, &canonical), canonical);
        for perm in [[1, 0, 3, 2], [3, 2, 1, 0], [2, 0, 3, 1]] {
            let relabeled = g.relabeled(&table, &perm);
            assert_eq!(canon::canonical_form(&table, &relabeled), canonical);
        }
        assert!(canon::are_isomorphic(&table, &g, &g.relabeled(&table, &[2, 0, 3, 1])));
        assert!(!canon::are_isomorphic(&table, &g, &star4(&table)));
    }

    #[test]
    fn fingerprints_separate_path_from_star() {
        let table = EdgeTable::new(4);
        assert_ne!(
            canon::invariant_fingerprint(&table, &path4(&table)),
            canon::invariant_fingerprint(&table, &star4(&table))
        );
        assert_ne!(
            canon::wl_fingerprint(&table, &path4(&table), canon::WL_ROUNDS),
            canon::wl_fingerprint(&table, &star4(&table), canon::WL_ROUNDS)
        );
    }

    #[test]
    fn reduction_collapses_isomorphs() {
        let table = EdgeTable::new(4);
        let trees: Vec<Graph> = CandidateGenerator::new(&table, 3).collect();
        // the 16 spanning trees fall into two classes: the path and the star
        let reps = canon::reduce_to_reps(&table, &trees);
        assert_eq!(reps.len(), 2);
    }

    #[test]
    fn embedder_accepts_triangle_and_diamond() {
        let table = EdgeTable::new(3);
        let points = embed::embedding(&table, &triangle(&table)).expect("triangle embeds");
        for (i, j) in triangle(&table).edges(&table) {
            let (dx, dy) = (points[j][0] - points[i][0], points[j][1] - points[i][1]);
            let dist = (dx * dx + dy * dy).sqrt();
            assert!((dist - 1.0).abs() <= embed::EDGE_TOL);
        }

        let table = EdgeTable::new(4);
        assert!(embed::is_penny(&table, &diamond(&table)));
    }

    #[test]
    fn embedder_rejects_a_six_leaf_star() {
        // six unit disks around one all touching it must touch each other
        let table = EdgeTable::new(7);
        let star6 = Graph::from_edges(&table, (1..7).map(|leaf| (0, leaf)));
        assert!(!embed::is_penny(&table, &star6));
    }

    #[test]
    #[should_panic(expected = "penny embedder")]
    fn embedder_rejects_k4_input_loudly() {
        let table = EdgeTable::new(4);
        let k4 = Graph::from_edges(&table, [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let _ = embed::is_penny(&table, &k4);
    }

    #[test]
    fn maximality_filter_drops_contained_graphs() {
        let table = EdgeTable::new(4);
        assert!(maximal::is_isomorphic_subgraph_of(&table, &path4(&table), &diamond(&table)));
        let kept = maximal::filter_maximal(&table, &[path4(&table), diamond(&table)]);
        assert_eq!(kept, vec![diamond(&table)]);
    }

    #[test]
    fn polyiamond_layer_counts_match_the_free_counts() {
        let layers = polyiamond::enumerate_layers(6);
        let counts: Vec<usize> = layers.iter().map(Vec::len).collect();
        assert_eq!(counts, vec![1, 1, 1, 3, 4, 12]);
    }

    #[test]
    fn unit_polyiamond_projects_to_a_triangle() {
        let unit = polyiamond::Polyiamond::unit();
        assert_eq!(unit.contact_counts(), (3, 3));
        let table = EdgeTable::new(3);
        assert_eq!(unit.contact_graph(&table), triangle(&table));
        assert_eq!(
            polyiamond::contact_graphs_matching(&table, 1, 1, 3),
            vec![triangle(&table)]
        );
    }

    #[test]
    fn hexagon_polyiamond_matches_the_seven_penny_flower() {
        // six triangles around one lattice point: 7 vertices, 12 unit edges
        let layers = polyiamond::enumerate_layers(6);
        assert!(layers[5].iter().any(|p| p.contact_counts() == (7, 12)));
    }

    #[test]
    fn spiral_edge_counts() {
        assert_eq!(build_spiral(2).edges().len(), 1);
        assert_eq!(build_spiral(3).edges().len(), 3);
        assert_eq!(build_spiral(7).edges().len(), 12);
        assert_eq!(build_spiral(19).edges().len(), 42);
    }

    #[test]
    fn centered_hexagonal_orders() {
        assert!(spiral::is_centered_hexagonal(1));
        assert!(spiral::is_centered_hexagonal(7));
        assert!(spiral::is_centered_hexagonal(19));
        assert!(spiral::is_centered_hexagonal(37));
        assert!(!spiral::is_centered_hexagonal(13));
        assert!(!spiral::is_centered_hexagonal(18));
    }

    #[test]
    fn seed_slots_of_the_nineteen_spiral() {
        // orbits under the 6-fold symmetry: center, inner ring, outer
        // corners, outer edge-centers
        let s19 = build_spiral(19);
        let seeds = spiral::symmetry_seed_slots(&s19);
        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds[0], 0);
        assert_eq!(seeds[1], 1);
        assert!(seeds[2..].iter().all(|&slot| (7..19).contains(&slot)));
    }

    #[test]
    fn pair_table_round_trips() {
        let pairs = PairTable::new(13);
        assert_eq!(pairs.num_pairs(), 78);
        for id in 0..pairs.num_pairs() {
            let (a, b) = pairs.items(id);
            assert!(a < b);
            assert_eq!(pairs.pair_id(UnorderedPair(a, b)), id);
            assert_eq!(pairs.pair_id(UnorderedPair(b, a)), id);
        }
    }

    #[test]
    fn triangle_alone_covers_three_items() {
        let table = EdgeTable::new(3);
        let pairs = PairTable::new(3);
        let shape = Shape::from_graph(&table, &triangle(&table));
        let search = CoverSearch::new(&pairs, vec![&shape], SearchPolicy::standard());

        let witness = search.run(&WorkerCtx::natural(3)).expect("k = 1 suffices");
        assert_eq!(witness.arrangements, vec![vec![0, 1, 2]]);
        assert!(witness.covers_all(&pairs, &[&shape]));
    }

    #[test]
    fn one_arrangement_decides_under_the_sharded_dispatcher() {
        // k = 1 has no first-item choice; the sharded driver must still
        // report the trivial identity witness
        let table = EdgeTable::new(3);
        let pairs = PairTable::new(3);
        let shape = Shape::from_graph(&table, &triangle(&table));
        let search = CoverSearch::new(&pairs, vec![&shape], SearchPolicy::standard());

        let witness =
            dispatch::run_backtrack_sharded(&search, two_workers()).expect("k = 1 suffices");
        assert_eq!(witness.arrangements, vec![vec![0, 1, 2]]);

        let (combo, witness) = dispatch::search_shape_combinations(
            &pairs,
            &[&shape],
            1,
            &SearchPolicy::standard(),
            two_workers(),
        )
        .expect("the single combination decides");
        assert_eq!(combo, vec![0]);
        assert!(witness.covers_all(&pairs, &[&shape]));
    }

    #[test]
    fn a_path_alone_does_not_cover_three_items() {
        let pairs = PairTable::new(3);
        let shape = Shape::from_edges(3, [(0, 1), (1, 2)]);
        let search = CoverSearch::new(&pairs, vec![&shape], SearchPolicy::standard());
        assert!(search.run(&WorkerCtx::natural(3)).is_none());
    }

    #[test]
    fn two_diamonds_cover_four_items() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));
        let search = CoverSearch::new(&pairs, vec![&shape, &shape], SearchPolicy::standard());

        let witness = search.run(&WorkerCtx::natural(4)).expect("one extra arrangement");
        assert_eq!(witness.arrangements[0], vec![0, 1, 2, 3]);
        assert!(witness.covers_all(&pairs, &[&shape, &shape]));
    }

    #[test]
    fn zero_overlap_cap_makes_two_diamonds_impossible() {
        // only one pair is missing after the identity, so a second diamond
        // arrangement must overlap on four edges; a zero cap forbids that
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));
        let policy = SearchPolicy {
            overlap_caps: Some(vec![0]),
            ..SearchPolicy::standard()
        };
        let search = CoverSearch::new(&pairs, vec![&shape, &shape], policy);
        assert!(search.run(&WorkerCtx::natural(4)).is_none());
    }

    #[test]
    fn two_stars_never_cover_four_items() {
        // every pair a star covers involves the item at its center slot
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &star4(&table));
        let search = CoverSearch::new(&pairs, vec![&shape, &shape], SearchPolicy::standard());
        assert!(dispatch::run_backtrack_sharded(&search, two_workers()).is_none());
    }

    #[test]
    fn seeded_workers_find_a_path_cover() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &path4(&table));
        let search = CoverSearch::new(&pairs, vec![&shape, &shape], SearchPolicy::standard());

        let witness = dispatch::run_backtrack(&search, two_workers(), 7).expect("paths pair up");
        assert!(witness.covers_all(&pairs, &[&shape, &shape]));
    }

    #[test]
    fn unique_min_degree_slot_detection() {
        // triangle with a pendant: the pendant slot is the unique minimum
        let paw = Shape::from_edges(4, [(0, 1), (0, 2), (1, 2), (2, 3)]);
        assert_eq!(paw.unique_min_degree_slot(), Some(3));
        let diamond_shape = Shape::from_edges(4, [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(diamond_shape.unique_min_degree_slot(), None);
    }

    #[test]
    fn seed_slots_constrain_item_zero() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));
        let policy = SearchPolicy {
            item0_seed_slots: Some(vec![0]),
            ..SearchPolicy::standard()
        };
        let search = CoverSearch::new(&pairs, vec![&shape, &shape], policy);

        let witness = search.run(&WorkerCtx::natural(4)).expect("still coverable");
        let slot_of_zero = witness.arrangements[1].iter().position(|&item| item == 0);
        assert_eq!(slot_of_zero, Some(0));
        assert!(witness.covers_all(&pairs, &[&shape, &shape]));
    }

    #[test]
    fn shape_combinations_find_the_star_diamond_pairing() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let star = Shape::from_graph(&table, &star4(&table));
        let diamond_shape = Shape::from_graph(&table, &diamond(&table));

        let (combo, witness) = dispatch::search_shape_combinations(
            &pairs,
            &[&star, &diamond_shape],
            2,
            &SearchPolicy::standard(),
            two_workers(),
        )
        .expect("the star plus a diamond covers");
        assert_eq!(combo, vec![0, 1]);
        assert!(witness.covers_all(&pairs, &[&star, &diamond_shape]));
    }

    #[test]
    fn mixed_shape_levels_keep_the_capacity_bound() {
        // star then two disjoint edges then diamond: {1,2}, {1,3}, {2,3}
        // remain after the identity, and no two of them are disjoint, so the
        // two-edge level can never cover two new pairs at once. Any witness
        // wastes that level, which a fair-share quota computed from its own
        // edge count would forbid; the bound must come from what the diamond
        // level can still contribute.
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let star = Shape::from_graph(&table, &star4(&table));
        let two_edges = Shape::from_edges(4, [(0, 1), (2, 3)]);
        let diamond_shape = Shape::from_graph(&table, &diamond(&table));
        let shapes = vec![&star, &two_edges, &diamond_shape];
        let search = CoverSearch::new(&pairs, shapes.clone(), SearchPolicy::standard());

        let witness = search.run(&WorkerCtx::natural(4)).expect("the diamond finishes the cover");
        assert!(witness.covers_all(&pairs, &shapes));
    }

    fn verify_spiral_witness(n: usize, tail: &[Vec<usize>]) {
        let pairs = PairTable::new(n);
        let shape = Shape::from_edges(n, build_spiral(n).edges().iter().copied());
        let mut arrangements = vec![(0..n).collect::<Vec<usize>>()];
        arrangements.extend(tail.iter().cloned());
        let witness = Witness { arrangements };
        let shapes: Vec<&Shape> = std::iter::repeat(&shape).take(tail.len() + 1).collect();
        assert!(witness.covers_all(&pairs, &shapes));
    }

    #[test]
    fn known_witness_for_fifteen_items() {
        verify_spiral_witness(
            15,
            &[
                vec![4, 11, 7, 10, 6, 12, 1, 5, 14, 0, 9, 3, 8, 13, 2],
                vec![12, 14, 9, 5, 8, 0, 10, 1, 3, 6, 11, 13, 7, 2, 4],
                vec![8, 14, 11, 3, 5, 6, 7, 12, 2, 1, 13, 0, 9, 4, 10],
            ],
        );
    }

    #[test]
    fn known_witness_for_seventeen_items() {
        verify_spiral_witness(
            17,
            &[
                vec![0, 8, 15, 9, 16, 12, 10, 5, 13, 2, 6, 3, 7, 14, 11, 1, 4],
                vec![10, 13, 16, 6, 14, 1, 15, 11, 0, 7, 2, 4, 9, 12, 8, 3, 5],
                vec![11, 4, 7, 5, 9, 6, 8, 16, 3, 10, 15, 12, 2, 14, 0, 13, 1],
            ],
        );
    }

    #[test]
    fn known_witness_for_nineteen_items() {
        verify_spiral_witness(
            19,
            &[
                vec![8, 16, 2, 5, 13, 15, 10, 14, 0, 7, 4, 12, 9, 18, 1, 11, 17, 3, 6],
                vec![4, 18, 10, 17, 1, 16, 11, 0, 15, 12, 7, 13, 2, 14, 5, 3, 9, 6, 8],
                vec![1, 10, 12, 18, 2, 15, 7, 5, 0, 17, 8, 14, 3, 16, 13, 6, 4, 9, 11],
                vec![15, 0, 16, 18, 8, 17, 9, 13, 5, 12, 6, 1, 10, 2, 4, 3, 7, 14, 11],
            ],
        );
    }

    #[test]
    fn both_family_routes_produce_the_diamond_class() {
        // every 5-edge graph on 4 vertices is a diamond, the unique maximal
        // penny graph there; the two-triangle polyiamonds project to it too
        let table = EdgeTable::new(4);
        let generated = FamilySource::GenerateVerify { edge_count: 5 }
            .produce(&table)
            .unwrap();
        assert_eq!(generated.len(), 1);
        assert!(canon::are_isomorphic(&table, &generated[0], &diamond(&table)));

        let projected = FamilySource::Polyiamond { min_size: 2, max_size: 2, edge_count: 5 }
            .produce(&table)
            .unwrap();
        assert_eq!(projected.len(), 1);
        assert!(canon::are_isomorphic(&table, &projected[0], &diamond(&table)));
    }

    #[test]
    fn decider_variants_agree_on_the_diamond_completion() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));

        let backtrack = dispatch::Decider::Backtrack {
            search: CoverSearch::new(&pairs, vec![&shape, &shape], SearchPolicy::standard()),
            workers: two_workers(),
            mode: dispatch::BacktrackMode::Sharded,
        };
        let witness = backtrack.decide().unwrap().expect("two diamonds cover");
        assert!(witness.covers_all(&pairs, &[&shape, &shape]));

        let (candidates, _) =
            prefix::read_prefix_lines(4, Cursor::new("3,2,1,0\n")).unwrap();
        let sat = dispatch::Decider::SatStream {
            pairs: &pairs,
            shape: &shape,
            candidates,
            workers: two_workers(),
        };
        let witness = sat.decide().unwrap().expect("the prefix completes");
        assert!(witness.covers_all(&pairs, &[&shape, &shape, &shape]));
    }

    #[test]
    fn sat_completion_finds_the_missing_pair() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));
        let adjacency = sat::adjacency_matrix(&shape);
        let uncovered = vec![UnorderedPair(0, 3)];

        let arrangement = CompletionProblem::new(4, &adjacency, &uncovered)
            .solve()
            .unwrap()
            .expect("the diamond can seat 0 next to 3");

        let mut coverage = crate::cover::Coverage::new(pairs.num_pairs());
        shape.apply(&pairs, &arrangement, &mut coverage);
        assert!(coverage.contains(pairs.pair_id(UnorderedPair(0, 3))));
    }

    #[test]
    fn sat_completion_reports_unsat() {
        // one edge cannot seat two disjoint pairs
        let shape = Shape::from_edges(4, [(0, 1)]);
        let adjacency = sat::adjacency_matrix(&shape);
        let uncovered = vec![UnorderedPair(0, 1), UnorderedPair(2, 3)];
        let outcome = CompletionProblem::new(4, &adjacency, &uncovered)
            .solve()
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn prefix_lines_parse_and_validate() {
        assert_eq!(
            prefix::parse_prefix_line(4, "1,0,3,2;2,3,0,1").unwrap(),
            vec![vec![1, 0, 3, 2], vec![2, 3, 0, 1]]
        );
        assert!(prefix::parse_prefix_line(4, "1,0,3").is_err());
        assert!(prefix::parse_prefix_line(4, "1,1,2,3").is_err());
        assert!(prefix::parse_prefix_line(4, "1,0,x,2").is_err());

        let input = "3,2,1,0\nnot a line\n0,1,3,2\n";
        let (candidates, skipped) = prefix::read_prefix_lines(4, Cursor::new(input)).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(candidates[1].index, 1);
        assert_eq!(candidates[1].arrangements, vec![vec![0, 1, 3, 2]]);
    }

    #[test]
    fn sat_stream_completes_a_good_prefix() {
        let table = EdgeTable::new(4);
        let pairs = PairTable::new(4);
        let shape = Shape::from_graph(&table, &diamond(&table));

        // the reversal leaves exactly {0, 3} uncovered, which one more
        // arrangement supplies
        let input = "3,2,1,0\n";
        let (candidates, _) = prefix::read_prefix_lines(4, Cursor::new(input)).unwrap();
        let solution = dispatch::run_sat_stream(&pairs, &shape, candidates, two_workers())
            .unwrap()
            .expect("completion exists");

        let mut arrangements = vec![(0..4).collect::<Vec<usize>>()];
        arrangements.extend(solution.candidate.arrangements.iter().cloned());
        arrangements.push(solution.completion);
        let witness = Witness { arrangements };
        assert!(witness.covers_all(&pairs, &[&shape, &shape, &shape]));
    }
}
