use todo_lists::models::{ListId, StoreError, TitleError, Todo, TodoId, TodoList};
use todo_lists::store::{
    sorted_view, validate_list_title, validate_todo_title, Titled, TodoStore,
};

fn titles<'a, T: Titled + 'a>(view: impl IntoIterator<Item = &'a T>) -> Vec<String> {
    view.into_iter().map(|item| item.title().to_string()).collect()
}

#[test]
fn test_list_title_validation_boundaries() {
    let store = TodoStore::default();
    for len in [1, 2, 50, 99, 100] {
        let title = "t".repeat(len);
        assert_eq!(store.validate_list_title(&title), Ok(()), "length {}", len);
    }
    for len in [0, 101, 250] {
        let title = "t".repeat(len);
        assert_eq!(
            store.validate_list_title(&title),
            Err(TitleError::ListTitleLength),
            "length {}",
            len
        );
    }
}

#[test]
fn test_duplicate_list_title_is_rejected() {
    let mut store = TodoStore::default();
    store.create_list("Groceries".to_string());

    assert_eq!(
        validate_list_title("Groceries", store.lists()),
        Err(TitleError::DuplicateListTitle)
    );
    assert_eq!(
        TitleError::DuplicateListTitle.to_string(),
        "The title must be unique."
    );
    // Different case is a different title.
    assert_eq!(validate_list_title("GROCERIES", store.lists()), Ok(()));
}

#[test]
fn test_todo_title_messages() {
    assert_eq!(
        validate_todo_title("").unwrap_err().to_string(),
        "The Todo must be between 1 and 100 chars."
    );
    assert_eq!(
        TitleError::ListTitleLength.to_string(),
        "The title must be between 1 and 100 chars."
    );
}

#[test]
fn test_create_then_find_list() {
    let mut store = TodoStore::default();
    let created = store.create_list("Work".to_string()).clone();

    let found = store.find_list(&created.id).unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.title, "Work");
    assert!(found.todos.is_empty());
}

#[test]
fn test_complete_all_implies_list_completed() {
    let mut store = TodoStore::default();
    let list_id = store.create_list("Chores".to_string()).id.clone();
    for title in ["Laundry", "Dishes", "Vacuum"] {
        store.create_todo(&list_id, title.to_string()).unwrap();
    }
    assert!(!store.find_list(&list_id).unwrap().is_completed());

    store.set_all_todos_completed(&list_id, true).unwrap();
    let list = store.find_list(&list_id).unwrap();
    assert!(list.is_completed());
    assert_eq!(list.count_incomplete(), 0);
}

#[test]
fn test_delete_todo_removes_only_that_todo() {
    let mut store = TodoStore::default();
    let list_id = store.create_list("Chores".to_string()).id.clone();
    let keep = store
        .create_todo(&list_id, "Keep".to_string())
        .unwrap()
        .id
        .clone();
    let remove = store
        .create_todo(&list_id, "Remove".to_string())
        .unwrap()
        .id
        .clone();

    let missing = TodoId::from("missing");
    assert_eq!(
        store.delete_todo(&list_id, &missing),
        Err(StoreError::TodoNotFound(missing))
    );
    assert_eq!(store.find_list(&list_id).unwrap().todos.len(), 2);

    let removed = store.delete_todo(&list_id, &remove).unwrap();
    assert_eq!(removed.title, "Remove");
    let list = store.find_list(&list_id).unwrap();
    assert_eq!(list.todos.len(), 1);
    assert_eq!(list.todos[&keep].title, "Keep");
}

#[test]
fn test_missing_list_is_not_found() {
    let mut store = TodoStore::default();
    let missing = ListId::from("nope");
    assert_eq!(
        store.find_list(&missing),
        Err(StoreError::ListNotFound(missing.clone()))
    );
    assert_eq!(
        store.delete_list(&missing),
        Err(StoreError::ListNotFound(missing.clone()))
    );
    assert_eq!(
        store.set_all_todos_completed(&missing, true),
        Err(StoreError::ListNotFound(missing))
    );
    assert!(!store.is_modified());
}

#[test]
fn test_sorted_view_examples() {
    let done = TodoList::new("B".to_string());
    let mut open = TodoList::new("A".to_string());
    let todo = Todo::new("open".to_string());
    open.todos.insert(todo.id.clone(), todo);
    let lists = vec![done, open];

    let view = sorted_view(lists.iter(), TodoList::is_completed);
    assert_eq!(titles(view.values()), vec!["A", "B"]);

    let mut milk = Todo::new("Milk".to_string());
    milk.completed = true;
    let eggs = Todo::new("Eggs".to_string());
    let todos = vec![milk, eggs];
    let view = sorted_view(todos.iter(), |todo| todo.completed);
    assert_eq!(titles(view.values()), vec!["Eggs", "Milk"]);
}

#[test]
fn test_sorted_view_properties() {
    let entries = [
        ("pears", true),
        ("Apples", false),
        ("bread", false),
        ("apples", true),
        ("Zucchini", false),
        ("cheese", true),
        ("Bread", false),
    ];
    let todos: Vec<Todo> = entries
        .iter()
        .map(|(title, completed)| {
            let mut todo = Todo::new(title.to_string());
            todo.completed = *completed;
            todo
        })
        .collect();

    let once = sorted_view(todos.iter(), |todo| todo.completed);
    let twice = sorted_view(once.values(), |todo| todo.completed);
    assert_eq!(
        once.keys().collect::<Vec<_>>(),
        twice.keys().collect::<Vec<_>>()
    );
    assert_eq!(once.len(), todos.len());

    let flags: Vec<bool> = once.values().map(|todo| todo.completed).collect();
    let first_done = flags.iter().position(|done| *done).unwrap();
    assert!(flags[first_done..].iter().all(|done| *done));

    let folded: Vec<String> = once
        .values()
        .map(|todo| caseless::default_case_fold_str(&todo.title))
        .collect();
    assert!(folded[..first_done].windows(2).all(|w| w[0] <= w[1]));
    assert!(folded[first_done..].windows(2).all(|w| w[0] <= w[1]));

    // Equal folded titles keep their incoming relative order.
    let bread: Vec<&str> = once
        .values()
        .filter(|todo| caseless::default_case_fold_str(&todo.title) == "bread")
        .map(|todo| todo.title.as_str())
        .collect();
    assert_eq!(bread, vec!["bread", "Bread"]);
}

#[test]
fn test_sorted_view_folds_sharp_s() {
    let todos: Vec<Todo> = ["Strasz", "Straße", "Strand"]
        .iter()
        .map(|title| Todo::new(title.to_string()))
        .collect();
    let view = sorted_view(todos.iter(), |_| false);
    assert_eq!(titles(view.values()), vec!["Strand", "Straße", "Strasz"]);
}

#[test]
fn test_sorted_lists_on_store() {
    let mut store = TodoStore::default();
    let b = store.create_list("b list".to_string()).id.clone();
    store.create_todo(&b, "open".to_string()).unwrap();
    let a = store.create_list("A list".to_string()).id.clone();
    store.create_todo(&a, "open".to_string()).unwrap();
    store.create_list("empty".to_string());

    let view = store.sorted_lists();
    assert_eq!(titles(view.values()), vec!["A list", "b list", "empty"]);
}
