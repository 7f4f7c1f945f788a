//! Register-then-search through the in-memory store

use sesmatch::form::{run_action, submit, Services};
use sesmatch::matching::{
    build_query_request, build_upsert_payload, Category, Entry, RecordIdGenerator, Revision,
};
use sesmatch::vector_store::{MemoryStore, VectorStore};
use sesmatch::{Action, FormState};

use sesmatch::embeddings::RandomEmbedder;

fn upsert(store: &MemoryStore, record_id: &str, entry: &Entry) {
    let record = build_upsert_payload(entry, record_id.to_string(), vec![0.6, 0.8, 0.0]);
    store.upsert(&[record]).unwrap();
}

fn search(store: &MemoryStore, entry: &Entry) -> Vec<String> {
    store
        .query(&build_query_request(entry, vec![0.6, 0.8, 0.0]))
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect()
}

#[test]
fn test_engineer_found_from_project_side_only() {
    let store = MemoryStore::new("ns1");
    upsert(
        &store,
        "vec-1",
        &Entry::new("Java developer, 5 years").with_category(Category::Engineer),
    );

    let from_project = Entry::new("Java project").with_category(Category::Project);
    let from_engineer = Entry::new("Java project").with_category(Category::Engineer);

    assert_eq!(search(&store, &from_project), vec!["vec-1"]);
    assert!(search(&store, &from_engineer).is_empty());
}

#[test]
fn test_id_filter_combines_with_category() {
    let store = MemoryStore::new("ns1");
    upsert(
        &store,
        "vec-1",
        &Entry::new("Rust, 3 years").with_id("E-42").with_category(Category::Engineer),
    );
    upsert(
        &store,
        "vec-2",
        &Entry::new("Rust, 8 years").with_id("E-43").with_category(Category::Engineer),
    );

    let matching_id = Entry::new("q").with_id("E-42").with_category(Category::Project);
    let other_id = Entry::new("q").with_id("E-99").with_category(Category::Project);
    let no_id = Entry::new("q").with_category(Category::Project);

    assert_eq!(search(&store, &matching_id), vec!["vec-1"]);
    assert!(search(&store, &other_id).is_empty());
    assert_eq!(search(&store, &no_id).len(), 2);
}

#[test]
fn test_search_returns_at_most_two() {
    let store = MemoryStore::new("ns1");
    for i in 0..5 {
        upsert(
            &store,
            &format!("vec-{}", i),
            &Entry::new(format!("project {}", i)).with_category(Category::Project),
        );
    }

    let from_engineer = Entry::new("q").with_category(Category::Engineer);
    assert_eq!(search(&store, &from_engineer).len(), 2);
}

#[test]
fn test_form_cycle_against_memory_store() {
    let services = Services::new(
        Revision::Categorized,
        Box::new(RandomEmbedder::new(8)),
        Box::new(MemoryStore::new("ns1")),
        RecordIdGenerator::default(),
    );

    let form = FormState::new(Revision::Categorized).with_fields(
        "Java developer, 5 years",
        "",
        Some(Category::Engineer),
    );
    let form = submit(form, Action::Register, &services);
    assert_eq!(
        form.last_response.as_ref().unwrap().content,
        "Registered: Java developer, 5 years, category: engineer"
    );

    let form = form.with_fields("Java project", "", Some(Category::Project));
    let form = submit(form, Action::Search, &services);
    let content = &form.last_response.as_ref().unwrap().content;
    assert!(content.starts_with("Search results (project searching, engineer extracted): ["));
    assert!(content.contains("\"content\":\"Java developer, 5 years\""));
    assert!(!content.contains("\"values\""));

    // Same-side search sees nothing
    let response = run_action(
        &services,
        Action::Search,
        &Entry::new("Java").with_category(Category::Engineer),
    )
    .unwrap();
    assert_eq!(
        response.content,
        "Search results (engineer searching, project extracted): []"
    );
}
