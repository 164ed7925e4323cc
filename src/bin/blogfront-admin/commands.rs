use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use blogfront::api::{ApiClient, Credentials};
use blogfront::content::ContentFile;
use blogfront::editor::{format_price, EditorError, ImageUpload, RecordEditor};
use blogfront::fetcher::{FetchParams, ResourceFetcher, ViewState};
use blogfront::guard::{GuardState, RouteGuard};
use blogfront::model::BlogRecord;
use blogfront::session::{FileTokenStore, Session};
use blogfront::text_utils::format_date;

use crate::{BlogArgs, IdArgs, ListArgs, LoginArgs, UpdateArgs};

type AdminSession = Session<FileTokenStore>;

/// Verifies the stored session and hands back its token.
async fn authorized_token<'a>(api: &ApiClient, session: &'a mut AdminSession) -> Result<&'a str> {
    let mut guard = RouteGuard::new();
    if guard.check(session, api).await != GuardState::Authorized {
        bail!("Not logged in. Please run blogfront-admin login");
    }
    session.token().ok_or_else(|| anyhow!("Not logged in. Please run blogfront-admin login"))
}

pub(crate) async fn login(api: &ApiClient, session: &mut AdminSession, args: LoginArgs) -> Result<()> {
    let credentials = Credentials {
        email: args.email.trim().to_string(),
        password: args.password,
    };

    let token = match api.login(&credentials).await {
        Ok(token) => token,
        Err(e) => bail!("{}", e.server_message().unwrap_or("Login failed")),
    };
    session.set_session(&token)
        .with_context(|| format!("Error writing session file {}", session.store().path().display()))?;

    println!("Logged in as {}", credentials.email);
    Ok(())
}

pub(crate) fn logout(session: &mut AdminSession) -> Result<()> {
    session.clear_session()
        .with_context(|| format!("Error removing session file {}", session.store().path().display()))?;
    println!("Logged out");
    Ok(())
}

pub(crate) async fn status(api: &ApiClient, session: &mut AdminSession) -> Result<()> {
    let mut guard = RouteGuard::new();
    match guard.check(session, api).await {
        GuardState::Authorized => println!("Logged in ({})", api.base_url()),
        _ => println!("Not logged in"),
    }
    Ok(())
}

fn print_blogs(blogs: &[BlogRecord]) {
    for blog in blogs {
        let date = blog.created_at.as_ref().map(format_date).unwrap_or_default();
        let price = blog.price.map(|p| format!("${}", format_price(p))).unwrap_or_default();
        println!("{:<26} {:<16} {:<12} {:>9}  {}", blog.id, blog.category, date, price, blog.title);
    }
}

pub(crate) async fn list(api: &ApiClient, args: ListArgs) -> Result<()> {
    let params = match (args.category, args.search) {
        (Some(category), _) => FetchParams::Category(category),
        (None, Some(query)) => FetchParams::Search(query),
        (None, None) => FetchParams::All,
    };

    let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
    fetcher.load(params, |p| async move { p.fetch_list(api).await }).await;
    if let Some(notice) = fetcher.take_notice() {
        bail!("{}", notice.message);
    }

    match fetcher.state() {
        ViewState::Populated(blogs) => {
            print_blogs(blogs);
            println!("{} post{}", blogs.len(), if blogs.len() == 1 { "" } else { "s" });
        }
        _ => println!("No blogs found"),
    }
    Ok(())
}

pub(crate) async fn stats(api: &ApiClient, session: &mut AdminSession) -> Result<()> {
    let token = authorized_token(api, session).await?;
    let stats = api.admin_stats(token).await
        .map_err(|e| anyhow!("{}", e.server_message().unwrap_or("Error fetching stats")))?;

    println!("Blogs:      {}", stats.total_blogs);
    println!("Views:      {}", stats.total_views);
    println!("Categories: {}", stats.total_categories);
    Ok(())
}

fn image_content_type(path: &Path) -> &'static str {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn read_image(path: &Path) -> Result<ImageUpload> {
    let data = fs::read(path).with_context(|| format!("Error reading image {}", path.display()))?;
    let file_name = path.file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| anyhow!("Invalid image file name {}", path.display()))?;

    Ok(ImageUpload {
        file_name: file_name.to_string(),
        content_type: image_content_type(path).to_string(),
        data,
    })
}

/// Copies the given options over the editor form. Missing options keep
/// what the form already holds.
fn apply_args(editor: &mut RecordEditor, args: BlogArgs) -> Result<()> {
    let form = &mut editor.form;
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(path) = args.content_file {
        let content = ContentFile::from_file(&path)
            .with_context(|| format!("Error reading content file {}", path.display()))?;
        form.content = content.to_html();
    }
    if let Some(category) = args.category {
        form.category = category;
    }
    if let Some(price) = args.price {
        form.price = price;
    }
    if let Some(link) = args.link {
        form.affiliate_link = link;
    }
    for tag in args.tags.iter() {
        form.tags.add(tag);
    }
    for tag in args.remove_tags.iter() {
        form.tags.remove(tag.trim());
    }
    if let Some(path) = args.image {
        form.image = Some(read_image(&path)?);
    }
    Ok(())
}

async fn submit(api: &ApiClient, session: &AdminSession, editor: &RecordEditor) -> Result<()> {
    match editor.submit(api, session).await {
        Ok(outcome) => {
            println!("{}", outcome.notice.message);
            if let Some(blog) = outcome.blog {
                println!("{} /blog/{}", blog.id, blog.slug);
            }
            Ok(())
        }
        Err(EditorError::Validation(e)) => bail!("Invalid blog: {}", e),
        Err(e) => {
            let message = e.notice().map(|n| n.message).unwrap_or_else(|| e.to_string());
            bail!("{}", message)
        }
    }
}

pub(crate) async fn create(api: &ApiClient, session: &mut AdminSession, args: BlogArgs) -> Result<()> {
    authorized_token(api, session).await?;

    let mut editor = RecordEditor::create();
    apply_args(&mut editor, args)?;
    submit(api, session, &editor).await
}

pub(crate) async fn update(api: &ApiClient, session: &mut AdminSession, args: UpdateArgs) -> Result<()> {
    let token = authorized_token(api, session).await?;
    let record = match api.admin_blog(token, &args.id).await {
        Ok(record) => record,
        Err(e) if e.is_not_found() => bail!("Blog not found: {}", args.id),
        Err(e) => bail!("{}", e.server_message().unwrap_or("Error fetching blog")),
    };

    let mut editor = RecordEditor::edit(&record);
    apply_args(&mut editor, args.blog)?;
    submit(api, session, &editor).await
}

pub(crate) async fn delete(api: &ApiClient, session: &mut AdminSession, args: IdArgs) -> Result<()> {
    let token = authorized_token(api, session).await?;
    match api.delete_blog(token, &args.id).await {
        Ok(message) => {
            println!("{}", message.unwrap_or_else(|| "Blog deleted successfully!".to_string()));
            Ok(())
        }
        Err(e) => bail!("{}", e.server_message().unwrap_or("Error deleting blog")),
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::path::PathBuf;

    use super::*;

    fn record() -> BlogRecord {
        BlogRecord {
            id: "b1".to_string(),
            slug: "pixel-review".to_string(),
            title: "Pixel review".to_string(),
            description: "A phone".to_string(),
            content: "<p>Body</p>".to_string(),
            category: "Mobiles".to_string(),
            price: Some(499.0),
            affiliate_link: None,
            tags: vec!["android".to_string(), "camera".to_string()],
            image: Some("https://img.example.com/pixel.png".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(image_content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(image_content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut editor = RecordEditor::edit(&record());
        let args = BlogArgs {
            price: Some("459.99".to_string()),
            tags: vec!["5g".to_string(), "camera".to_string()],
            remove_tags: vec![" android ".to_string()],
            ..BlogArgs::default()
        };
        apply_args(&mut editor, args).unwrap();

        assert_eq!(editor.form.title, "Pixel review");
        assert_eq!(editor.form.price, "459.99");
        assert_eq!(editor.form.tags.as_slice(), ["camera".to_string(), "5g".to_string()]);
        assert_eq!(editor.preview.as_deref(), Some("https://img.example.com/pixel.png"));
        assert!(editor.form.validate().is_ok());
    }

    #[test]
    fn test_apply_renders_markdown_content() {
        let path: PathBuf = env::temp_dir().join(format!("blogfront-content-{}.md", std::process::id()));
        fs::write(&path, "# Verdict\n\nBuy it.").unwrap();

        let mut editor = RecordEditor::create();
        let args = BlogArgs {
            content_file: Some(path.clone()),
            ..BlogArgs::default()
        };
        let res = apply_args(&mut editor, args);
        fs::remove_file(&path).unwrap();

        res.unwrap();
        assert!(editor.form.content.contains("<h1>Verdict</h1>"));
        assert!(editor.form.content.contains("<p>Buy it.</p>"));
    }

    #[test]
    fn test_apply_rejects_unknown_content_type() {
        let mut editor = RecordEditor::create();
        let args = BlogArgs {
            content_file: Some(PathBuf::from("notes.txt")),
            ..BlogArgs::default()
        };
        assert!(apply_args(&mut editor, args).is_err());
    }
}
