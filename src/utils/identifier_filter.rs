use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::store::repos::Repos;

/// Expected capacity and false-positive rate.
/// Tune these based on real enrollment counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static IDENTIFIER_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(
        FILTER_CAPACITY,
        FALSE_POSITIVE_RATE,
    ))
});

#[inline]
fn normalize(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// Check if an identifier might be taken (false positives possible)
pub fn might_exist(identifier: &str) -> bool {
    let identifier = normalize(identifier);
    IDENTIFIER_FILTER
        .read()
        .expect("identifier filter poisoned")
        .contains(&identifier)
}

/// Insert a single identifier into the filter
pub fn insert(identifier: &str) {
    let identifier = normalize(identifier);
    IDENTIFIER_FILTER
        .write()
        .expect("identifier filter poisoned")
        .add(&identifier);
}

/// Remove an identifier from the filter
pub fn remove(identifier: &str) {
    let identifier = normalize(identifier);
    IDENTIFIER_FILTER
        .write()
        .expect("identifier filter poisoned")
        .remove(&identifier);
}

/// Every value that must stay unique across the system: admin username,
/// student index numbers, teacher usernames and employee ids, class codes,
/// plus every account email.
pub fn taken_identifiers(repos: &Repos) -> Vec<String> {
    let mut identifiers = Vec::new();

    if let Some(admin) = repos.admin().get() {
        identifiers.push(normalize(&admin.username));
        identifiers.push(normalize(&admin.email));
    }
    for student in repos.students().list() {
        identifiers.push(normalize(&student.index_number));
        identifiers.push(normalize(&student.email));
    }
    for teacher in repos.teachers().list() {
        identifiers.push(normalize(&teacher.username));
        identifiers.push(normalize(&teacher.employee_id));
        identifiers.push(normalize(&teacher.email));
    }
    for class in repos.classes().list() {
        identifiers.push(normalize(&class.class_code));
    }

    identifiers
}

/// Warm up the identifier filter from the record store in batches
pub fn warmup_identifier_filter(repos: &Repos, batch_size: usize) -> Result<()> {
    let identifiers = taken_identifiers(repos);

    for batch in identifiers.chunks(batch_size) {
        insert_batch(batch);
    }

    log::info!(
        "Identifier filter warmup complete: {} identifiers",
        identifiers.len()
    );
    Ok(())
}

/// Insert a batch of normalized identifiers
fn insert_batch(identifiers: &[String]) {
    let mut filter = IDENTIFIER_FILTER
        .write()
        .expect("identifier filter poisoned");

    for identifier in identifiers {
        filter.add(identifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_round_trip() {
        insert("CS/2099/042");
        assert!(might_exist("cs/2099/042"));

        remove("CS/2099/042");
        assert!(!might_exist("CS/2099/042"));
    }
}
