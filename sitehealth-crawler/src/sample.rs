use std::collections::HashSet;

/// Pick pages for expensive downstream measurement. The homepage and every
/// depth-1 page are always included, then a random remainder tops the
/// selection up to `sample_rate` of the total.
pub fn select_stratified_sample(
    pages: &[(String, usize)],
    homepage: &str,
    sample_rate: f64,
) -> Vec<String> {
    let mut selected: HashSet<&str> = HashSet::new();

    for (url, depth) in pages {
        if url == homepage || *depth == 1 {
            selected.insert(url.as_str());
        }
    }

    let target_count = selected
        .len()
        .max((pages.len() as f64 * sample_rate) as usize);
    let remaining_needed = target_count - selected.len();

    if remaining_needed > 0 {
        let mut remaining: Vec<&str> = pages
            .iter()
            .map(|(url, _)| url.as_str())
            .filter(|url| !selected.contains(url))
            .collect();
        fastrand::shuffle(&mut remaining);
        selected.extend(remaining.into_iter().take(remaining_needed));
    }

    let mut out: Vec<String> = selected.into_iter().map(String::from).collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<(String, usize)> {
        let mut pages = vec![
            ("https://a.test/".to_string(), 0),
            ("https://a.test/about".to_string(), 1),
            ("https://a.test/contact".to_string(), 1),
        ];
        for i in 0..20 {
            pages.push((format!("https://a.test/blog/{}", i), 2));
        }
        pages
    }

    #[test]
    fn test_homepage_and_depth_one_always_included() {
        let sample = select_stratified_sample(&pages(), "https://a.test/", 0.0);
        assert!(sample.contains(&"https://a.test/".to_string()));
        assert!(sample.contains(&"https://a.test/about".to_string()));
        assert!(sample.contains(&"https://a.test/contact".to_string()));
        assert_eq!(sample.len(), 3);
    }

    #[test]
    fn test_rate_tops_up_with_deeper_pages() {
        let pages = pages();
        let sample = select_stratified_sample(&pages, "https://a.test/", 0.5);
        assert_eq!(sample.len(), (pages.len() as f64 * 0.5) as usize);
        assert!(sample.contains(&"https://a.test/".to_string()));
    }

    #[test]
    fn test_full_rate_selects_everything() {
        let pages = pages();
        let sample = select_stratified_sample(&pages, "https://a.test/", 1.0);
        assert_eq!(sample.len(), pages.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(select_stratified_sample(&[], "https://a.test/", 0.5).is_empty());
    }
}
