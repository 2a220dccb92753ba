use crate::models::SessionData;
use crate::store::TodoStore;

/// A session with two lists, one of them fully completed.
pub fn sample_session() -> SessionData {
    let mut store = TodoStore::default();

    let groceries = store.create_list("Groceries".to_string()).id.clone();
    store
        .create_todo(&groceries, "Milk".to_string())
        .expect("list was just created");
    store
        .create_todo(&groceries, "Eggs".to_string())
        .expect("list was just created");

    let chores = store.create_list("Chores".to_string()).id.clone();
    store
        .create_todo(&chores, "Laundry".to_string())
        .expect("list was just created");
    store
        .set_all_todos_completed(&chores, true)
        .expect("list was just created");

    store.into_data()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_session_shape() {
        let data = sample_session();
        assert_eq!(data.lists.len(), 2);
        assert!(data.validate().is_ok());
        let completed: Vec<_> = data.lists.values().map(|l| l.is_completed()).collect();
        assert_eq!(completed, vec![false, true]);
    }
}
