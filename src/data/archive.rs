//! Year/month archive and featured list.
//!
//! Buckets are created lazily and re-sorted newest first after every insert.
//! At blog scale a full sort per insert is cheap, and keeps the ordering
//! independent of scan order.

use crate::content::Entry;
use crate::utils::date::month_key;
use chrono::Datelike;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entries of one month, newest first.
pub type Bucket = Vec<Arc<Entry>>;

#[derive(Debug, Clone, Default)]
pub struct Archive {
    years: BTreeMap<i32, BTreeMap<String, Bucket>>,
    featured: Vec<Arc<Entry>>,
}

impl Archive {
    /// Add an entry to its `(year, month)` bucket and, if featured, to the
    /// featured list.
    pub fn insert(&mut self, entry: Arc<Entry>) {
        let year = entry.date.year();
        let month = month_key(&entry.date);

        if entry.featured {
            self.featured.push(Arc::clone(&entry));
            sort_by_date(&mut self.featured);
        }

        let bucket = self.years.entry(year).or_default().entry(month).or_default();
        bucket.push(entry);
        sort_by_date(bucket);
    }

    /// Drop the entry with `url` from its bucket and the featured list.
    ///
    /// Empty buckets are pruned. Returns whether anything was removed.
    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.featured.len();
        self.featured.retain(|e| e.url != url);
        let mut removed = self.featured.len() != before;

        self.years.retain(|_, months| {
            months.retain(|_, bucket| {
                let len = bucket.len();
                bucket.retain(|e| e.url != url);
                removed |= bucket.len() != len;
                !bucket.is_empty()
            });
            !months.is_empty()
        });

        removed
    }

    /// Entries of `year`/`month` (`"06"`), newest first.
    pub fn bucket(&self, year: i32, month: &str) -> &[Arc<Entry>] {
        self.years
            .get(&year)
            .and_then(|months| months.get(month))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Years with entries, newest first.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().rev().copied()
    }

    /// Months (`"06"`) of `year` with entries, newest first.
    pub fn months(&self, year: i32) -> impl Iterator<Item = &str> + '_ {
        self.years
            .get(&year)
            .into_iter()
            .flat_map(|months| months.keys().rev())
            .map(String::as_str)
    }

    /// Featured entries, newest first.
    pub fn featured(&self) -> &[Arc<Entry>] {
        &self.featured
    }

    /// Number of archived entries.
    pub fn len(&self) -> usize {
        self.years
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

fn sort_by_date(entries: &mut [Arc<Entry>]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::date::parse_date;
    use std::path::PathBuf;

    pub(crate) fn entry(url: &str, date: &str, featured: bool) -> Entry {
        Entry {
            url: url.to_owned(),
            title: url.to_owned(),
            featured,
            date: parse_date(date).unwrap(),
            published: date.to_owned(),
            excerpt: String::new(),
            id: format!("tag:example.com,2021:{url}"),
            body: String::new(),
            source: PathBuf::from(format!("entries/{url}.md")),
        }
    }

    fn urls(entries: &[Arc<Entry>]) -> Vec<&str> {
        entries.iter().map(|e| e.url.as_str()).collect()
    }

    #[test]
    fn test_bucket_sorted_descending() {
        let mut archive = Archive::default();
        archive.insert(Arc::new(entry("first", "2021-06-03", false)));
        archive.insert(Arc::new(entry("second", "2021-06-10", false)));

        assert_eq!(urls(archive.bucket(2021, "06")), ["second", "first"]);
    }

    #[test]
    fn test_bucket_sorted_after_every_insert() {
        let mut archive = Archive::default();
        for (url, date) in [
            ("a", "2021-06-15"),
            ("b", "2021-06-01"),
            ("c", "2021-06-30"),
            ("d", "2021-06-20"),
        ] {
            archive.insert(Arc::new(entry(url, date, false)));
            let bucket = archive.bucket(2021, "06");
            assert!(bucket.windows(2).all(|w| w[0].date >= w[1].date));
        }
        assert_eq!(urls(archive.bucket(2021, "06")), ["c", "d", "a", "b"]);
    }

    #[test]
    fn test_buckets_by_year_and_month() {
        let mut archive = Archive::default();
        archive.insert(Arc::new(entry("jan", "2020-01-05", false)));
        archive.insert(Arc::new(entry("dec", "2020-12-25", false)));
        archive.insert(Arc::new(entry("june", "2021-06-03", false)));

        assert_eq!(archive.years().collect::<Vec<_>>(), [2021, 2020]);
        let months: Vec<_> = archive.months(2020).collect();
        assert_eq!(months, ["12", "01"]);
        assert_eq!(archive.len(), 3);
        assert!(archive.bucket(2019, "01").is_empty());
    }

    #[test]
    fn test_featured_only_flagged_and_sorted() {
        let mut archive = Archive::default();
        archive.insert(Arc::new(entry("old", "2019-03-01", true)));
        archive.insert(Arc::new(entry("plain", "2021-01-01", false)));
        archive.insert(Arc::new(entry("new", "2020-08-01", true)));

        assert_eq!(urls(archive.featured()), ["new", "old"]);
    }

    #[test]
    fn test_remove_prunes_empty_buckets() {
        let mut archive = Archive::default();
        archive.insert(Arc::new(entry("only", "2021-06-03", true)));

        assert!(archive.remove("only"));
        assert!(archive.is_empty());
        assert!(archive.featured().is_empty());
        assert!(!archive.remove("only"));
    }

    #[test]
    fn test_remove_then_reinsert_moves_bucket() {
        let mut archive = Archive::default();
        archive.insert(Arc::new(entry("post", "2021-06-03", false)));

        archive.remove("post");
        archive.insert(Arc::new(entry("post", "2021-07-01", false)));

        assert!(archive.bucket(2021, "06").is_empty());
        assert_eq!(urls(archive.bucket(2021, "07")), ["post"]);
        assert_eq!(archive.len(), 1);
    }
}
