use tracing::debug;

use crate::llm::Embedder;

/// Lexical similarity in [0, 1]: containment in either direction scores 1.0,
/// otherwise longest-common-substring length over the longer input.
pub fn string_ratio(clue: &str, candidate: &str) -> f64 {
    let a = clue.to_lowercase();
    let b = candidate.to_lowercase();

    if b.contains(&a) || a.contains(&b) {
        return 1.0;
    }

    let lcs = longest_common_substring(&a, &b);
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    lcs as f64 / max_len as f64
}

fn longest_common_substring(a: &str, b: &str) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev = vec![0usize; b.len() + 1];
    let mut longest = 0;
    for i in 1..=a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                row[j] = prev[j - 1] + 1;
                longest = longest.max(row[j]);
            }
        }
        prev = row;
    }
    longest
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

async fn semantic_ratio(embedder: &dyn Embedder, clue: &str, candidate: &str) -> f64 {
    match embedder.embed(&[clue, candidate]).await {
        Ok(vectors) if vectors.len() >= 2 => {
            let score = (cosine(&vectors[0], &vectors[1]) + 1.0) / 2.0;
            score.clamp(0.0, 1.0)
        }
        Ok(_) => 0.0,
        Err(e) => {
            debug!("embedding lookup failed, semantic score is 0: {}", e);
            0.0
        }
    }
}

/// Fitness of a candidate parameter against a clue, in [0, 1]. The lexical
/// stage decides alone when it is confident (containment, or ratio >= 0.6);
/// below that the embedding cosine, remapped from [-1, 1] to [0, 1], can only
/// raise the score. Without an embedder the lexical ratio stands.
pub async fn score(clue: &str, candidate: &str, embedder: Option<&dyn Embedder>) -> f64 {
    let ratio = string_ratio(clue, candidate);
    if ratio >= 0.6 {
        return ratio.clamp(0.0, 1.0);
    }
    let semantic = match embedder {
        Some(embedder) => {
            semantic_ratio(embedder, &clue.to_lowercase(), &candidate.to_lowercase()).await
        }
        None => 0.0,
    };
    ratio.max(semantic).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::errors::SondoError;
    use crate::llm::Embedder;

    struct FixedEmbedder {
        vectors: Vec<Vec<f64>>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _inputs: &[&str]) -> Result<Vec<Vec<f64>>, SondoError> {
            Ok(self.vectors.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _inputs: &[&str]) -> Result<Vec<Vec<f64>>, SondoError> {
            Err(SondoError::Network("connection refused".into()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_containment_scores_one() {
        assert_eq!(string_ratio("ssid", "wifi_ssid=payload"), 1.0);
        assert_eq!(string_ratio("SSID", "wifi_ssid"), 1.0);
        assert_eq!(string_ratio("wifi_ssid_extra", "ssid"), 1.0);
    }

    #[test]
    fn test_substring_ratio() {
        // "timez" is the longest run shared by the pair below
        let r = string_ratio("timezone", "timez_set=1");
        assert!((r - 5.0 / 11.0).abs() < 1e-9);
        assert_eq!(string_ratio("abc", "xyz"), 0.0);
    }

    #[tokio::test]
    async fn test_score_ssid_against_wifi_ssid() {
        assert_eq!(score("ssid", "wifi_ssid", None).await, 1.0);
    }

    #[tokio::test]
    async fn test_score_without_embedder_falls_back_to_ratio() {
        let s = score("timezone", "tz=gmt", None).await;
        assert!(s < 0.6);
        assert!((0.0..=1.0).contains(&s));
    }

    #[tokio::test]
    async fn test_semantic_can_only_raise() {
        let embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![1.0, 0.0]],
        };
        // identical vectors: cosine 1 -> remapped 1
        let s = score("alpha", "omega", Some(&embedder)).await;
        assert_eq!(s, 1.0);

        let embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![-1.0, 0.0]],
        };
        // opposed vectors: cosine -1 -> remapped 0, lexical ratio stands
        let s = score("alpha", "omega", Some(&embedder)).await;
        assert!((0.0..=1.0).contains(&s));
    }

    #[tokio::test]
    async fn test_embedding_failure_scores_zero_semantic() {
        let s = score("alpha", "omega", Some(&FailingEmbedder)).await;
        let lexical = string_ratio("alpha", "omega");
        assert_eq!(s, lexical.max(0.0));
    }

    #[tokio::test]
    async fn test_confident_lexical_skips_embedder() {
        // ratio >= 0.6 must decide without touching the embedder; a failing
        // embedder proves it is never called
        let s = score("hideSsid", "hideSsid2", Some(&FailingEmbedder)).await;
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_bounds_on_edge_inputs() {
        assert_eq!(string_ratio("", ""), 1.0);
        assert_eq!(string_ratio("", "anything"), 1.0);
    }
}
