//! 评论串的服务端渲染。
//!
//! 每条评论渲染作者信息、相对时间、编辑入口，以及正文 (Markdown) 或编辑表单。

use chrono::{DateTime, Utc};
use domain::{
    access::can_edit,
    editor::{CommentEditor, EditorState, Notice},
    relative::{edit_tooltip, last_updated_label},
    Comment, User, Viewer,
};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// HTML/XML 文本与属性转义
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 标题锚点，与目录链接使用同一规则
pub fn anchor_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && id.ends_with('-') {
            continue;
        }
        id.push(c);
    }
    id.trim_end_matches('-').to_string()
}

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "irc", "ircs", "xmpp"];

/// 相对地址和白名单协议放行，其余 (javascript:, data: ...) 清空
fn is_safe_url(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return true;
    };
    let scheme = &url[..colon];
    // 冒号在路径、查询或锚点里时仍是相对地址
    if scheme.contains(|c: char| matches!(c, '/' | '?' | '#')) {
        return true;
    }
    SAFE_SCHEMES
        .iter()
        .any(|safe| scheme.eq_ignore_ascii_case(safe))
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("")
    }
}

/// GFM 风格 Markdown，单个换行即换行，原始 HTML 一律转义
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut events: Vec<Event> = Parser::new_ext(source, options)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: sanitize_url(dest_url),
                title,
                id,
            }),
            other => other,
        })
        .collect();

    for i in 0..events.len() {
        let needs_id = matches!(&events[i], Event::Start(Tag::Heading { id: None, .. }));
        if !needs_id {
            continue;
        }
        let mut text = String::new();
        for event in &events[i + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(anchor_id(&text).into());
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

pub struct ThreadPage<'a> {
    pub upgrade_guide: &'a str,
    pub comments: &'a [Comment],
    pub authors: &'a HashMap<String, User>,
    pub viewer: Option<&'a Viewer>,
    /// 正在编辑的那一条
    pub editor: Option<&'a CommentEditor>,
    pub notice: Option<&'a Notice>,
    pub now: DateTime<Utc>,
}

impl ThreadPage<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let guide = escape_markup(self.upgrade_guide);
        out.push_str(&format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Comments on {guide}</title></head><body>\n"
        ));
        if let Some(notice) = self.notice {
            out.push_str(&render_notice(notice));
        }
        out.push_str(&format!("<section class=\"comments\" data-upgrade-guide=\"{guide}\">\n"));

        // 父评论不在当前列表里的按顶层处理
        let known: std::collections::HashSet<&str> =
            self.comments.iter().map(|c| c.id.as_str()).collect();
        let mut children: HashMap<&str, Vec<&Comment>> = HashMap::new();
        let mut roots = Vec::new();
        for c in self.comments {
            match c.parent_comment_id.as_deref() {
                Some(parent) if known.contains(parent) => {
                    children.entry(parent).or_default().push(c)
                }
                _ => roots.push(c),
            }
        }

        for root in roots {
            self.render_node(&mut out, root, 0, &children);
        }
        out.push_str("</section>\n</body></html>\n");
        out
    }

    fn render_node(
        &self,
        out: &mut String,
        comment: &Comment,
        depth: usize,
        children: &HashMap<&str, Vec<&Comment>>,
    ) {
        let editor = self
            .editor
            .filter(|e| e.is_editing() && e.comment_id() == comment.id);
        let item = CommentItem {
            comment,
            author: self.authors.get(&comment.author_id),
            viewer: self.viewer,
            editor,
            threaded: depth > 0,
            now: self.now,
        };
        out.push_str(&item.open());
        if let Some(replies) = children.get(comment.id.as_str()) {
            for reply in replies {
                self.render_node(out, reply, depth + 1, children);
            }
        }
        out.push_str("</article>\n");
    }
}

pub struct CommentItem<'a> {
    pub comment: &'a Comment,
    pub author: Option<&'a User>,
    pub viewer: Option<&'a Viewer>,
    pub editor: Option<&'a CommentEditor>,
    pub threaded: bool,
    pub now: DateTime<Utc>,
}

impl CommentItem<'_> {
    /// 不含闭合标签，回复嵌在里面
    pub fn open(&self) -> String {
        let c = self.comment;
        let id = escape_markup(&c.id);
        let guide = escape_markup(c.upgrade_guide.as_str());
        let raw_name = self.author.map(|a| a.name.as_str()).unwrap_or("[Unknown]");
        let name = escape_markup(raw_name);
        let initial = escape_markup(&raw_name.chars().take(1).collect::<String>());
        let class = if self.threaded {
            "comment threaded-comment"
        } else {
            "comment"
        };

        let mut out = String::new();
        out.push_str(&format!("<article class=\"{class}\" id=\"comment-{id}\">\n"));
        out.push_str(&format!(
            "<header class=\"comment-header\"><div class=\"comment-author\"><span class=\"avatar\" aria-label=\"{name}\">{initial}</span><div><div class=\"author-name\">{name}</div>"
        ));
        if self.author.is_some_and(|a| a.role.is_admin()) {
            out.push_str("<div class=\"core-team\">Core Team</div>");
        }
        out.push_str("</div></div><div class=\"comment-meta\">");

        if can_edit(self.viewer, c) {
            let tooltip = escape_markup(&edit_tooltip(c.created_at, c.updated_at));
            let count = if c.edit_count > 0 {
                format!("{} ", c.edit_count)
            } else {
                String::new()
            };
            out.push_str(&format!(
                "<a class=\"edit\" href=\"/threads/{guide}?edit={id}#comment-{id}\" title=\"{tooltip}\">{count}Edit</a>"
            ));
        }
        out.push_str(&format!(
            "<time datetime=\"{}\">{}</time></div></header>\n",
            c.updated_at.to_rfc3339(),
            last_updated_label(c.updated_at, self.now)
        ));

        out.push_str("<div class=\"comment-body\">");
        match self.editor.and_then(CommentEditor::draft) {
            Some(draft) => {
                // 提交中禁用表单
                let submitting = matches!(
                    self.editor.map(CommentEditor::state),
                    Some(EditorState::Submitting { .. })
                );
                let disabled = if submitting { " disabled" } else { "" };
                out.push_str(&format!(
                    "<form method=\"post\" action=\"/threads/{guide}/comments/{id}\"><fieldset{disabled}><textarea name=\"comment\">{}</textarea><div class=\"actions\"><a class=\"cancel\" href=\"/threads/{guide}#comment-{id}\">Cancel</a><button type=\"submit\">Update</button></div></fieldset></form>",
                    escape_markup(draft)
                ));
            }
            None => {
                out.push_str(&format!(
                    "<div class=\"markdown\">{}</div>",
                    render_markdown(&c.comment)
                ));
            }
        }
        out.push_str("</div>\n");
        out
    }
}

pub fn render_notice(notice: &Notice) -> String {
    let (class, text) = match notice {
        Notice::Success(text) => ("toast toast-success", text),
        Notice::Error(text) => ("toast toast-error", text),
    };
    format!("<div class=\"{class}\" role=\"status\">{}</div>\n", escape_markup(text))
}
