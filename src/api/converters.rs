//! Conversion functions from feed pages to API DTOs

use crate::api::dto::*;
use crate::config::MediaConfig;
use crate::service::{DecoratedPost, FeedPage};

/// Convert FeedPage to FeedPageResponse
pub fn page_to_response(page: &FeedPage, media: &MediaConfig) -> FeedPageResponse {
    FeedPageResponse {
        records: page
            .records
            .iter()
            .map(|record| record_to_response(record, media))
            .collect(),
        pagination: PaginationResponse {
            next_cursor: page.next_cursor.clone(),
            limit: page.limit,
            total_matching_count: page.total_matching_count,
        },
    }
}

/// Convert DecoratedPost to PostRecordResponse
pub fn record_to_response(record: &DecoratedPost, media: &MediaConfig) -> PostRecordResponse {
    let post = &record.post;
    let author = record.author.as_ref();

    PostRecordResponse {
        id: post.id.clone(),
        author: AuthorResponse {
            username: post.author.clone(),
            nickname: author.and_then(|info| info.nickname.clone()),
            avatar_url: author
                .and_then(|info| info.avatar_key.as_deref())
                .map(|key| media.url_for(key)),
        },
        content: post.content.clone(),
        created_at: post.created_at,
        location: post.location().map(|location| LocationResponse {
            longitude: location.longitude,
            latitude: location.latitude,
            accuracy: location.accuracy,
        }),
        image_url: post.image_key.as_deref().map(|key| media.url_for(key)),
        like_count: record.engagement.like_count,
        viewer_liked: record.engagement.viewer_liked,
        comment_count: record.engagement.comment_count,
        repost_of_id: post.repost_of_id.clone(),
        repost: record
            .repost
            .as_deref()
            .map(|original| Box::new(record_to_response(original, media))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DisplayInfo, Post};
    use crate::service::Engagement;

    fn media() -> MediaConfig {
        MediaConfig {
            public_url: "https://media.example.com/".to_string(),
        }
    }

    #[test]
    fn absent_fields_are_omitted() {
        let record = DecoratedPost {
            post: Post::new("ghost", "hello"),
            author: None,
            engagement: Engagement::default(),
            repost: None,
        };

        let json = serde_json::to_value(record_to_response(&record, &media())).unwrap();
        let object = json.as_object().unwrap();
        for absent in ["location", "image_url", "repost_of_id", "repost"] {
            assert!(!object.contains_key(absent), "{absent} should be omitted");
        }
        assert_eq!(json["author"], serde_json::json!({ "username": "ghost" }));
        assert_eq!(json["like_count"], 0);
        assert_eq!(json["viewer_liked"], false);
    }

    #[test]
    fn media_keys_become_urls_and_reposts_nest() {
        let mut original = Post::new("quinn", "look");
        original.image_key = Some("posts/q.jpg".to_string());
        original.latitude = Some(35.0);

        let mut repost = Post::new("pat", "");
        repost.repost_of_id = Some(original.id.clone());

        let record = DecoratedPost {
            post: repost,
            author: Some(DisplayInfo {
                nickname: Some("Pat".to_string()),
                avatar_key: Some("avatars/pat.png".to_string()),
            }),
            engagement: Engagement::default(),
            repost: Some(Box::new(DecoratedPost {
                post: original.clone(),
                author: None,
                engagement: Engagement {
                    like_count: 3,
                    viewer_liked: true,
                    comment_count: 1,
                },
                repost: None,
            })),
        };

        let response = record_to_response(&record, &media());
        assert_eq!(
            response.author.avatar_url.as_deref(),
            Some("https://media.example.com/avatars/pat.png")
        );

        let embedded = response.repost.unwrap();
        assert_eq!(embedded.id, original.id);
        assert_eq!(
            embedded.image_url.as_deref(),
            Some("https://media.example.com/posts/q.jpg")
        );
        assert_eq!(embedded.location.unwrap().latitude, Some(35.0));
        assert_eq!(embedded.like_count, 3);
        assert!(embedded.viewer_liked);
        assert!(embedded.repost.is_none());
    }
}
