//! Server-rendered pages.
//!
//! Templates are compiled into the binary and parsed once at startup. Every
//! page body is rendered first and then wrapped in the shared layout, which
//! also shows the flash messages drained for this response.

use crate::models::{Flash, TodoList};
use crate::store::sorted_view;
use liquid::{ParserBuilder, Template};
use serde::Serialize;

const LAYOUT: &str = include_str!("../../templates/layout.liquid");
const LISTS: &str = include_str!("../../templates/lists.liquid");
const NEW_LIST: &str = include_str!("../../templates/new_list.liquid");
const LIST: &str = include_str!("../../templates/list.liquid");
const EDIT_LIST: &str = include_str!("../../templates/edit_list.liquid");

pub const APPLICATION_JS: &str = include_str!("../../static/javascripts/application.js");

#[derive(Serialize)]
struct FlashView<'a> {
    kind: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct TodoView<'a> {
    id: &'a str,
    title: &'a str,
    completed: bool,
}

#[derive(Serialize)]
struct ListView<'a> {
    id: &'a str,
    title: &'a str,
    completed: bool,
    remaining: usize,
    total: usize,
    todos: Vec<TodoView<'a>>,
}

impl<'a> ListView<'a> {
    fn summary(list: &'a TodoList) -> Self {
        Self {
            id: list.id.as_str(),
            title: &list.title,
            completed: list.is_completed(),
            remaining: list.count_incomplete(),
            total: list.todos.len(),
            todos: Vec::new(),
        }
    }
}

#[derive(Serialize)]
struct LayoutContext<'a> {
    page_title: &'a str,
    content: String,
    flashes: Vec<FlashView<'a>>,
}

#[derive(Serialize)]
struct ListsContext<'a> {
    list_count: usize,
    lists: Vec<ListView<'a>>,
}

#[derive(Serialize)]
struct ListContext<'a> {
    list: ListView<'a>,
    list_title: &'a str,
    todo_title: &'a str,
}

#[derive(Serialize)]
struct NewListContext<'a> {
    list_title: &'a str,
}

pub struct Views {
    layout: Template,
    lists: Template,
    new_list: Template,
    list: Template,
    edit_list: Template,
}

impl Views {
    pub fn new() -> Result<Self, liquid::Error> {
        let parser = ParserBuilder::with_stdlib().build()?;
        Ok(Self {
            layout: parser.parse(LAYOUT)?,
            lists: parser.parse(LISTS)?,
            new_list: parser.parse(NEW_LIST)?,
            list: parser.parse(LIST)?,
            edit_list: parser.parse(EDIT_LIST)?,
        })
    }

    fn render_page<C: Serialize>(
        &self,
        template: &Template,
        page_title: &str,
        flashes: &[Flash],
        context: &C,
    ) -> Result<String, liquid::Error> {
        let content = template.render(&liquid::to_object(context)?)?;
        let layout = LayoutContext {
            page_title,
            content,
            flashes: flashes
                .iter()
                .map(|flash| FlashView {
                    kind: flash.kind.as_str(),
                    message: &flash.message,
                })
                .collect(),
        };
        self.layout.render(&liquid::to_object(&layout)?)
    }

    /// `lists` is expected in display order already.
    pub fn lists_page<'a, I>(&self, flashes: &[Flash], lists: I) -> Result<String, liquid::Error>
    where
        I: IntoIterator<Item = &'a TodoList>,
    {
        let lists: Vec<ListView<'_>> = lists.into_iter().map(ListView::summary).collect();
        let context = ListsContext {
            list_count: lists.len(),
            lists,
        };
        self.render_page(&self.lists, "Lists", flashes, &context)
    }

    pub fn new_list_page(&self, flashes: &[Flash], list_title: &str) -> Result<String, liquid::Error> {
        self.render_page(
            &self.new_list,
            "New List",
            flashes,
            &NewListContext { list_title },
        )
    }

    /// Renders one list with open todos first. `todo_title` refills the
    /// new-todo input after a rejected submission.
    pub fn list_page(
        &self,
        flashes: &[Flash],
        list: &TodoList,
        todo_title: &str,
    ) -> Result<String, liquid::Error> {
        let todos = sorted_view(list.todos.values(), |todo| todo.completed);
        let mut view = ListView::summary(list);
        view.todos = todos
            .values()
            .map(|todo| TodoView {
                id: todo.id.as_str(),
                title: &todo.title,
                completed: todo.completed,
            })
            .collect();

        let context = ListContext {
            list: view,
            list_title: &list.title,
            todo_title,
        };
        self.render_page(&self.list, &list.title, flashes, &context)
    }

    pub fn edit_list_page(
        &self,
        flashes: &[Flash],
        list: &TodoList,
        list_title: &str,
    ) -> Result<String, liquid::Error> {
        let context = ListContext {
            list: ListView::summary(list),
            list_title,
            todo_title: "",
        };
        self.render_page(&self.edit_list, "Edit List", flashes, &context)
    }
}
