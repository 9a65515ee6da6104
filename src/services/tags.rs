// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ServiceError, require_text};
use crate::iam::policy::{Requirement, authorize};
use crate::iam::Identity;
use crate::notify::{ChangeNotifier, ChangeSignal};
use crate::store::tags::{TagRepository, TagUsage, name_taken};
use crate::store::{Database, Repository, Tag};
use serde::Deserialize;

const DEFAULT_POPULAR_TAGS: i64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct TagService {
    tags: TagRepository,
    notifier: ChangeNotifier,
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty())
}

impl TagService {
    pub fn new(db: Database, notifier: ChangeNotifier) -> Self {
        Self {
            tags: Repository::new(db),
            notifier,
        }
    }

    pub fn repository(&self) -> &TagRepository {
        &self.tags
    }

    pub async fn list(&self, keyword: Option<&str>) -> Vec<Tag> {
        let tags = self.tags.all_by_name().await;
        match keyword.map(str::trim).filter(|keyword| !keyword.is_empty()) {
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                tags.into_iter()
                    .filter(|tag| tag.name.to_lowercase().contains(&keyword))
                    .collect()
            }
            None => tags,
        }
    }

    pub async fn get(&self, id: i32) -> Result<Tag, ServiceError> {
        self.tags
            .get_by_id(&id)
            .await
            .ok_or_else(|| ServiceError::not_found("Tag", id))
    }

    pub async fn by_name(&self, name: &str) -> Option<Tag> {
        self.tags.by_name(name).await
    }

    pub async fn name_exists(&self, name: &str) -> bool {
        self.tags.name_exists(name, None).await
    }

    pub async fn with_articles(&self) -> Vec<TagUsage> {
        self.tags.with_articles().await
    }

    /// `count <= 0` falls back to ten.
    pub async fn most_used(&self, count: i64) -> Vec<TagUsage> {
        let count = if count <= 0 { DEFAULT_POPULAR_TAGS } else { count };
        self.tags
            .most_used(usize::try_from(count).unwrap_or(usize::MAX))
            .await
    }

    pub async fn create(
        &self,
        caller: Option<&Identity>,
        input: TagInput,
    ) -> Result<Tag, ServiceError> {
        authorize(caller, Requirement::Admin)?;
        require_text(&input.name, "Tag name")?;

        let tag = Tag {
            id: 0,
            name: input.name.trim().to_string(),
            note: clean_note(input.note),
        };
        let created = self
            .tags
            .database()
            .commit(|tables| {
                if name_taken(tables, &tag.name, None) {
                    return Err(ServiceError::conflict(format!(
                        "Tag name '{}' already exists",
                        tag.name
                    )));
                }
                TagRepository::insert_into(tables, tag).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Tag {} '{}' created", created.id, created.name);
        self.notifier.publish(ChangeSignal::TagsChanged);
        Ok(created)
    }

    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: i32,
        input: TagInput,
    ) -> Result<Tag, ServiceError> {
        authorize(caller, Requirement::Admin)?;

        let updated = self
            .tags
            .database()
            .commit(|tables| {
                if !tables.tags.contains_key(&id) {
                    return Err(ServiceError::not_found("Tag", id));
                }
                require_text(&input.name, "Tag name")?;
                let name = input.name.trim().to_string();
                if name_taken(tables, &name, Some(id)) {
                    return Err(ServiceError::conflict(format!(
                        "Tag name '{}' is used by another tag",
                        name
                    )));
                }
                let tag = Tag {
                    id,
                    name,
                    note: clean_note(input.note.clone()),
                };
                TagRepository::replace_in(tables, tag).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Tag {} updated", id);
        self.notifier.publish(ChangeSignal::TagsChanged);
        Ok(updated)
    }

    /// Refused while the tag is attached to any article.
    pub async fn delete(&self, caller: Option<&Identity>, id: i32) -> Result<(), ServiceError> {
        authorize(caller, Requirement::Admin)?;

        self.tags
            .database()
            .commit(|tables| {
                if !tables.tags.contains_key(&id) {
                    return Err(ServiceError::not_found("Tag", id));
                }
                let usage = tables.tag_usage(id);
                if usage > 0 {
                    return Err(ServiceError::conflict(format!(
                        "Cannot delete tag used by {} news article(s)",
                        usage
                    )));
                }
                TagRepository::remove_from(tables, &id)?;
                Ok(())
            })
            .await?;

        log::info!("Tag {} deleted", id);
        self.notifier.publish(ChangeSignal::TagsChanged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::store::associations::{attach_tags, detach_tag};
    use crate::store::StoreError;

    fn admin() -> Identity {
        Identity {
            account_id: 1,
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
        }
    }

    fn input(name: &str) -> TagInput {
        TagInput {
            name: name.to_string(),
            note: Some("  ".to_string()),
        }
    }

    fn service() -> TagService {
        TagService::new(Database::in_memory(), ChangeNotifier::new())
    }

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let service = service();
        let caller = admin();
        let campus = service
            .create(Some(&caller), input("Campus"))
            .await
            .expect("create");
        assert_eq!(campus.note, None);
        let sports = service
            .create(Some(&caller), input("Sports"))
            .await
            .expect("create");

        assert!(matches!(
            service.create(Some(&caller), input("campus")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service
                .update(Some(&caller), sports.id, input("CAMPUS"))
                .await,
            Err(ServiceError::Conflict(_))
        ));
        let renamed = service
            .update(Some(&caller), campus.id, input("campus"))
            .await
            .expect("same tag may change case");
        assert_eq!(renamed.name, "campus");
        assert!(matches!(
            service.update(Some(&caller), 99, input("Ghost")).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn only_admins_manage_tags() {
        let service = service();
        let staff = Identity {
            role: Role::Staff,
            ..admin()
        };
        assert!(matches!(
            service.create(Some(&staff), input("Campus")).await,
            Err(ServiceError::Denied)
        ));
        assert!(matches!(
            service.create(None, input("Campus")).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn delete_round_trip_through_attachment() {
        let service = service();
        let caller = admin();
        let tag = service
            .create(Some(&caller), input("Campus"))
            .await
            .expect("create");
        let db = service.repository().database().clone();
        db.commit(|tables| {
            attach_tags(tables, "1", &[tag.id]);
            Ok::<_, StoreError>(())
        })
        .await
        .expect("attach");

        assert!(matches!(
            service.delete(Some(&caller), tag.id).await,
            Err(ServiceError::Conflict(_))
        ));

        db.commit(|tables| {
            detach_tag(tables, "1", tag.id);
            Ok::<_, StoreError>(())
        })
        .await
        .expect("detach");
        service.delete(Some(&caller), tag.id).await.expect("delete");
        assert!(matches!(
            service.get(tag.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn most_used_defaults_to_ten() {
        let service = service();
        let caller = admin();
        for index in 0..12 {
            service
                .create(Some(&caller), input(&format!("tag-{:02}", index)))
                .await
                .expect("create");
        }
        assert_eq!(service.most_used(0).await.len(), 10);
        assert_eq!(service.most_used(-3).await.len(), 10);
        assert_eq!(service.most_used(3).await.len(), 3);
        assert_eq!(service.list(Some("TAG-1")).await.len(), 2);
    }
}
