use clade::validity::silhouette_samples;
use clade::{
    ari, Clustering, Dendrogram, DissimilarityMatrix, FeatureMatrix, FlatClustering,
    HierarchicalClustering, Kmeans, Linkage, Metric,
};
use proptest::prelude::*;

fn matrix() -> impl Strategy<Value = FeatureMatrix> {
    prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 3), 2..16)
        .prop_map(|rows| FeatureMatrix::from_rows(&rows).unwrap())
}

/// Points on a small integer grid: lots of exactly tied distances.
fn grid() -> impl Strategy<Value = FeatureMatrix> {
    prop::collection::vec((0u8..4, 0u8..4), 3..13).prop_map(|points| {
        let rows: Vec<Vec<f64>> = points
            .into_iter()
            .map(|(x, y)| vec![f64::from(x), f64::from(y)])
            .collect();
        FeatureMatrix::from_rows(&rows).unwrap()
    })
}

fn any_linkage() -> impl Strategy<Value = Linkage> {
    prop_oneof![
        Just(Linkage::Single),
        Just(Linkage::Complete),
        Just(Linkage::Average),
        Just(Linkage::Centroid),
        Just(Linkage::Ward),
    ]
}

fn merge_pairs(dendro: &Dendrogram) -> Vec<(usize, usize)> {
    dendro
        .merges()
        .iter()
        .map(|m| (m.cluster_a, m.cluster_b))
        .collect()
}

fn assert_same_tree(fast: &Dendrogram, slow: &Dendrogram) -> Result<(), TestCaseError> {
    prop_assert_eq!(merge_pairs(fast), merge_pairs(slow));
    for (x, y) in fast.heights().iter().zip(slow.heights()) {
        prop_assert!((x - y).abs() < 1e-9 * (1.0 + x.abs()), "{} vs {}", x, y);
    }
    Ok(())
}

fn monotone_linkage() -> impl Strategy<Value = Linkage> {
    prop_oneof![
        Just(Linkage::Single),
        Just(Linkage::Complete),
        Just(Linkage::Average),
        Just(Linkage::Ward),
    ]
}

proptest! {
    #[test]
    fn prop_dissimilarity_symmetric_zero_diagonal(
        data in matrix(),
        manhattan in any::<bool>()
    ) {
        let metric = if manhattan { Metric::Manhattan } else { Metric::Euclidean };
        let d = DissimilarityMatrix::compute(&data, metric).unwrap();
        for i in 0..d.n() {
            prop_assert_eq!(d.get(i, i), 0.0);
            for j in 0..d.n() {
                prop_assert_eq!(d.get(i, j), d.get(j, i));
                prop_assert!(d.get(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn prop_dendrogram_merges_and_heights(data in matrix(), linkage in monotone_linkage()) {
        let n = data.n_entities();
        let dendro = HierarchicalClustering::new(1)
            .with_linkage(linkage)
            .fit_dendrogram(&data)
            .unwrap();

        prop_assert_eq!(dendro.n_merges(), n - 1);
        prop_assert_eq!(dendro.root().unwrap().size, n);
        let heights = dendro.heights();
        for w in heights.windows(2) {
            prop_assert!(w[1] >= w[0] - 1e-9 * (1.0 + w[0].abs()), "{:?}", heights);
        }
    }

    #[test]
    fn prop_cut_to_k_is_exact(data in matrix(), linkage in monotone_linkage()) {
        let n = data.n_entities();
        let dendro = HierarchicalClustering::new(1)
            .with_linkage(linkage)
            .fit_dendrogram(&data)
            .unwrap();
        for k in 1..=n {
            let cut = dendro.cut_to_k(k).unwrap();
            prop_assert_eq!(cut.n_clusters(), k);
            prop_assert_eq!(cut.len(), n);
            prop_assert_eq!(cut.sizes().iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn prop_kmeans_all_assigned(data in matrix(), k in 1usize..5, seed in any::<u64>()) {
        prop_assume!(k <= data.n_entities());
        let labels = Kmeans::new(k).with_seed(seed).fit_predict(&data).unwrap();

        prop_assert_eq!(labels.len(), data.n_entities());
        prop_assert!(labels.n_clusters() <= k);
        for &l in labels.labels() {
            prop_assert!(l < labels.n_clusters());
        }
    }

    #[test]
    fn prop_kmeans_seeded_is_reproducible(data in matrix(), k in 1usize..5, seed in any::<u64>()) {
        prop_assume!(k <= data.n_entities());
        let model = Kmeans::new(k).with_restarts(4).with_seed(seed);
        prop_assert_eq!(model.fit(&data).unwrap(), model.fit(&data).unwrap());
    }

    #[test]
    fn prop_kmeans_keeps_best_restart(data in matrix(), k in 1usize..5, seed in any::<u64>()) {
        prop_assume!(k <= data.n_entities());
        let fit = Kmeans::new(k).with_restarts(5).with_seed(seed).fit(&data).unwrap();

        prop_assert_eq!(fit.restart_inertias.len(), 5);
        for &other in &fit.restart_inertias {
            prop_assert!(fit.inertia <= other);
        }
        prop_assert_eq!(fit.restart_inertias[fit.restart], fit.inertia);
    }

    #[test]
    fn prop_silhouette_bounded(data in matrix(), seed in any::<u64>()) {
        let n = data.n_entities();
        let d = DissimilarityMatrix::compute(&data, Metric::Euclidean).unwrap();
        for k in 2..=n.min(5) {
            let labels = Kmeans::new(k).with_seed(seed).fit_predict(&data).unwrap();
            if labels.n_clusters() < 2 {
                continue;
            }
            for s in silhouette_samples(&d, &labels).unwrap() {
                prop_assert!((-1.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn prop_ari_symmetric_and_bounded(
        a in prop::collection::vec(0usize..4, 2..30),
        shift in any::<u64>()
    ) {
        let b: Vec<usize> = a
            .iter()
            .enumerate()
            .map(|(i, &x)| (x + (shift as usize >> (i % 8))) % 3)
            .collect();
        let (fa, fb) = (
            FlatClustering::from_labels(&a).unwrap(),
            FlatClustering::from_labels(&b).unwrap(),
        );
        let ab = ari(&fa, &fb).unwrap();
        prop_assert!((ab - ari(&fb, &fa).unwrap()).abs() < 1e-12);
        prop_assert!(ab <= 1.0 + 1e-12);
        prop_assert!((ari(&fa, &fa).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_recurrence_matches_recomputation_on_grid(data in grid(), linkage in any_linkage()) {
        let d = DissimilarityMatrix::compute(&data, Metric::Euclidean).unwrap();
        let hc = HierarchicalClustering::new(1).with_linkage(linkage);
        assert_same_tree(&hc.build(&d).unwrap(), &hc.build_recomputed(&data, &d).unwrap())?;
    }

    #[test]
    fn prop_recurrence_matches_recomputation(data in matrix(), linkage in any_linkage()) {
        let d = DissimilarityMatrix::compute(&data, Metric::Euclidean).unwrap();
        let hc = HierarchicalClustering::new(1).with_linkage(linkage);
        assert_same_tree(&hc.build(&d).unwrap(), &hc.build_recomputed(&data, &d).unwrap())?;
    }

    #[test]
    fn prop_dendrogram_reproducible(data in grid(), linkage in any_linkage()) {
        let hc = HierarchicalClustering::new(1).with_linkage(linkage);
        let first = hc.fit_dendrogram(&data).unwrap();
        let second = hc.fit_dendrogram(&data).unwrap();

        prop_assert_eq!(merge_pairs(&first), merge_pairs(&second));
        let bits = |d: &Dendrogram| d.heights().iter().map(|h| h.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn prop_cut_at_height_applies_a_prefix(
        data in matrix(),
        linkage in any_linkage(),
        frac in 0.0f64..1.2
    ) {
        // Centroid trees may invert; the cut still stops at the first merge at or above h.
        let n = data.n_entities();
        let dendro = HierarchicalClustering::new(1)
            .with_linkage(linkage)
            .fit_dendrogram(&data)
            .unwrap();
        let top = dendro.heights().iter().copied().fold(0.0, f64::max);
        let h = frac * top;

        let applied = dendro.merges().iter().take_while(|m| m.height < h).count();
        let cut = dendro.cut_at_height(h).unwrap();
        prop_assert_eq!(cut.n_clusters(), n - applied);
        prop_assert_eq!(cut, dendro.cut_to_k(n - applied).unwrap());
    }
}
