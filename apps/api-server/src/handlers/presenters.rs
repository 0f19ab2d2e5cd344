//! Domain to DTO mapping.

use blog_core::Page;
use blog_core::domain::{AuthorRef, Category, CommentEntry, FeedEntry, Location, User};
use blog_shared::dto::{
    AuthorResponse, CategoryResponse, CommentResponse, LocationResponse, PageResponse,
    PostResponse, UserResponse,
};

pub fn author(author: AuthorRef) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        username: author.username,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
        is_published: category.is_published,
        created_at: category.created_at,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
        is_published: location.is_published,
        created_at: location.created_at,
    }
}

pub fn post(entry: FeedEntry) -> PostResponse {
    let post = entry.post;
    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        image: post.image,
        is_published: post.is_published,
        created_at: post.created_at,
        author: author(entry.author),
        category: entry.category.map(category),
        location: entry.location.map(location),
        comment_count: entry.comment_count,
    }
}

pub fn comment(entry: CommentEntry) -> CommentResponse {
    let comment = entry.comment;
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        text: comment.text,
        created_at: comment.created_at,
        author: author(entry.author),
    }
}

/// Email is private: only shown to the user themselves.
pub fn user(user: &User, show_email: bool) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: show_email.then(|| user.email.clone()),
        created_at: user.created_at,
    }
}

pub fn feed_page(page: Page<FeedEntry>) -> PageResponse<PostResponse> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(post);
    PageResponse {
        items: page.items,
        page: page.number,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
        has_next,
        has_previous,
    }
}
