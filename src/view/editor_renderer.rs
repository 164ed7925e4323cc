use std::io;

use ramhorns::Template;

use crate::api::encode_segment;
use crate::editor::{EditorMode, Field, RecordEditor, ValidationError, LISTING_PATH};
use crate::model::Category;
use crate::notice::Notice;
use crate::view::{compile, view_notice, Nav, ViewNotice};

#[derive(ramhorns::Content)]
struct ViewInput<'a> {
    value: &'a str,
    invalid: bool,
}

#[derive(ramhorns::Content)]
struct ViewOption {
    name: &'static str,
    selected: bool,
}

#[derive(ramhorns::Content)]
struct ViewTagItem<'a> {
    tag: &'a str,
}

#[derive(ramhorns::Content)]
struct EditorPage<'a> {
    nav: Nav,
    notice: Option<ViewNotice>,
    heading: &'static str,
    submit_label: &'static str,
    action: String,
    cancel_link: &'static str,
    error: String,
    has_error: bool,
    title: ViewInput<'a>,
    description: ViewInput<'a>,
    content: ViewInput<'a>,
    price: ViewInput<'a>,
    affiliate_link: ViewInput<'a>,
    category_invalid: bool,
    categories: Vec<ViewOption>,
    tags: Vec<ViewTagItem<'a>>,
    tag_list: String,
    preview: Option<ViewPreview<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewPreview<'a> {
    image: &'a str,
}

fn view_input(value: &str, invalid: bool) -> ViewInput {
    ViewInput { value, invalid }
}

pub struct EditorRenderer<'a> {
    pub template: Template<'a>,
}

/// Form action for an editor mode.
pub fn editor_action(mode: &EditorMode) -> String {
    match mode {
        EditorMode::Create => "/dashboard/blogs/new".to_string(),
        EditorMode::Update(id) => format!("/dashboard/blogs/edit/{}", encode_segment(id)),
    }
}

impl EditorRenderer<'_> {
    pub fn new(tpl_src: &str) -> io::Result<EditorRenderer> {
        let template = compile(tpl_src, "editor")?;
        Ok(EditorRenderer { template })
    }

    /// Renders the form with the user's input kept as typed. A validation
    /// error marks its field and is shown above the form.
    pub fn render(&self, editor: &RecordEditor, error: Option<&ValidationError>, notice: Option<&Notice>) -> String {
        let form = &editor.form;
        let invalid = |field: Field| error.map(|e| e.field == field).unwrap_or(false);
        let selected = Category::parse(&form.category);
        let (heading, submit_label) = if editor.mode.is_editing() {
            ("Edit Blog", "Update Blog")
        } else {
            ("Create New Blog", "Create Blog")
        };

        self.template.render(&EditorPage {
            nav: Nav::new(true),
            notice: view_notice(notice),
            heading,
            submit_label,
            action: editor_action(&editor.mode),
            cancel_link: LISTING_PATH,
            error: error.map(|e| e.to_string()).unwrap_or_default(),
            has_error: error.is_some(),
            title: view_input(&form.title, invalid(Field::Title)),
            description: view_input(&form.description, invalid(Field::Description)),
            content: view_input(&form.content, invalid(Field::Content)),
            price: view_input(&form.price, invalid(Field::Price)),
            affiliate_link: view_input(&form.affiliate_link, invalid(Field::AffiliateLink)),
            category_invalid: invalid(Field::Category),
            categories: Category::ALL.iter()
                .map(|c| ViewOption { name: c.name(), selected: selected == Some(*c) })
                .collect(),
            tags: form.tags.as_slice().iter().map(|t| ViewTagItem { tag: t }).collect(),
            tag_list: form.tags.as_slice().join(", "),
            preview: editor.preview.as_deref().map(|image| ViewPreview { image }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::BlogForm;
    use crate::view::test_data::blog;

    const TEMPLATE: &str = "{{heading}}|{{action}}|{{submit_label}}\
        |title={{#title}}{{value}}{{#invalid}}!{{/invalid}}{{/title}}\
        |cat={{#categories}}{{#selected}}{{name}}{{/selected}}{{/categories}}{{#category_invalid}}!{{/category_invalid}}\
        |tags={{tag_list}}\
        |preview={{#preview}}{{image}}{{/preview}}\
        |error={{error}}";

    #[test]
    fn render_create_with_error() {
        let renderer = EditorRenderer::new(TEMPLATE).unwrap();
        let mut editor = RecordEditor::create();
        editor.form = BlogForm {
            title: "".to_string(),
            description: "desc".to_string(),
            category: "gaming".to_string(),
            ..BlogForm::default()
        };
        editor.form.tags.add("rgb");
        editor.form.tags.add("wireless");
        let error = editor.form.validate().err().unwrap();

        let res = renderer.render(&editor, Some(&error), None);
        assert_eq!(res, "Create New Blog|/dashboard/blogs/new|Create Blog\
            |title=!|cat=Gaming|tags=rgb, wireless|preview=|error=title is required");
    }

    #[test]
    fn render_edit_prefilled() {
        let renderer = EditorRenderer::new(TEMPLATE).unwrap();
        let mut record = blog("console", "Gaming");
        record.tags = vec!["4k".to_string()];
        record.image = Some("https://img.example.com/console.png".to_string());
        let editor = RecordEditor::edit(&record);

        let res = renderer.render(&editor, None, None);
        assert_eq!(res, "Edit Blog|/dashboard/blogs/edit/id-console|Update Blog\
            |title=Review of console|cat=Gaming|tags=4k\
            |preview=https://img.example.com/console.png|error=");
    }

    #[test]
    fn unknown_category_is_marked() {
        let renderer = EditorRenderer::new("{{#categories}}{{#selected}}{{name}}{{/selected}}{{/categories}}{{#category_invalid}}!{{/category_invalid}}").unwrap();
        let mut editor = RecordEditor::create();
        editor.form = BlogForm {
            title: "t".to_string(),
            description: "d".to_string(),
            content: "c".to_string(),
            category: "Toasters".to_string(),
            ..BlogForm::default()
        };
        let error = editor.form.validate().err().unwrap();
        assert_eq!(renderer.render(&editor, Some(&error), None), "!");
    }
}
