// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ServiceError, require_text};
use crate::iam::policy::{self, Requirement, authorize};
use crate::iam::Identity;
use crate::notify::{ChangeNotifier, ChangeSignal};
use crate::store::categories::{CategoryDetails, CategoryRepository};
use crate::store::{Category, Database, Repository, Tables};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Active flag as submitted. `Unset` only exists at the boundary: creation resolves
/// it to `true`, updates keep the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ActiveFlag {
    #[default]
    Unset,
    True,
    False,
}

impl ActiveFlag {
    pub fn resolve(self, default: bool) -> bool {
        match self {
            ActiveFlag::Unset => default,
            ActiveFlag::True => true,
            ActiveFlag::False => false,
        }
    }
}

impl From<Option<bool>> for ActiveFlag {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => ActiveFlag::Unset,
            Some(true) => ActiveFlag::True,
            Some(false) => ActiveFlag::False,
        }
    }
}

impl From<ActiveFlag> for Option<bool> {
    fn from(flag: ActiveFlag) -> Self {
        match flag {
            ActiveFlag::Unset => None,
            ActiveFlag::True => Some(true),
            ActiveFlag::False => Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<i16>,
    #[serde(default)]
    pub is_active: ActiveFlag,
}

#[derive(Clone)]
pub struct CategoryService {
    categories: CategoryRepository,
    notifier: ChangeNotifier,
}

impl CategoryService {
    pub fn new(db: Database, notifier: ChangeNotifier) -> Self {
        Self {
            categories: Repository::new(db),
            notifier,
        }
    }

    pub fn repository(&self) -> &CategoryRepository {
        &self.categories
    }

    /// Admins see every category, everyone else only active ones. The optional
    /// keyword filters on name, ignoring case.
    pub async fn list(&self, caller: Option<&Identity>, keyword: Option<&str>) -> Vec<Category> {
        let categories = if caller.is_some_and(policy::is_admin) {
            self.categories.all_by_name().await
        } else {
            self.categories.active().await
        };
        match keyword.map(str::trim).filter(|keyword| !keyword.is_empty()) {
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                categories
                    .into_iter()
                    .filter(|category| category.name.to_lowercase().contains(&keyword))
                    .collect()
            }
            None => categories,
        }
    }

    pub async fn get(&self, id: i16) -> Result<Category, ServiceError> {
        self.categories
            .get_by_id(&id)
            .await
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    /// Category with its articles and child categories. Unpublished articles are
    /// only listed for callers allowed to see them.
    pub async fn details(
        &self,
        caller: Option<&Identity>,
        id: i16,
    ) -> Result<CategoryDetails, ServiceError> {
        let mut details = self
            .categories
            .with_details(id)
            .await
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        if !policy::sees_unpublished(caller) {
            details
                .articles
                .retain(|article| article.status.is_published());
        }
        Ok(details)
    }

    pub async fn active(&self) -> Vec<Category> {
        self.categories.active().await
    }

    pub async fn roots(&self) -> Vec<Category> {
        self.categories.roots().await
    }

    pub async fn children(&self, parent_id: i16) -> Vec<Category> {
        self.categories.subcategories(parent_id).await
    }

    pub async fn create(
        &self,
        caller: Option<&Identity>,
        input: CategoryInput,
    ) -> Result<Category, ServiceError> {
        authorize(caller, Requirement::AdminOrStaff)?;
        require_text(&input.name, "Category name")?;
        require_text(&input.description, "Category description")?;

        let category = Category {
            id: 0,
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            parent_id: input.parent_id,
            is_active: input.is_active.resolve(true),
        };
        let created = self
            .categories
            .database()
            .commit(|tables| {
                if let Some(parent_id) = category.parent_id {
                    ensure_parent_exists(tables, parent_id)?;
                }
                CategoryRepository::insert_into(tables, category).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Category {} '{}' created", created.id, created.name);
        self.notifier.publish(ChangeSignal::CategoriesChanged);
        Ok(created)
    }

    /// A blank description keeps the stored one, as does an unset active flag.
    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: i16,
        input: CategoryInput,
    ) -> Result<Category, ServiceError> {
        authorize(caller, Requirement::AdminOrStaff)?;

        let updated = self
            .categories
            .database()
            .commit(|tables| {
                let existing = tables
                    .categories
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("Category", id))?;
                require_text(&input.name, "Category name")?;
                if let Some(parent_id) = input.parent_id {
                    ensure_valid_parent(tables, id, parent_id)?;
                }

                let description = if input.description.trim().is_empty() {
                    existing.description.clone()
                } else {
                    input.description.trim().to_string()
                };
                let category = Category {
                    id,
                    name: input.name.trim().to_string(),
                    description,
                    parent_id: input.parent_id,
                    is_active: input.is_active.resolve(existing.is_active),
                };
                CategoryRepository::replace_in(tables, category).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Category {} updated", id);
        self.notifier.publish(ChangeSignal::CategoriesChanged);
        Ok(updated)
    }

    /// Refused while any article points at the category. Child categories become roots.
    pub async fn delete(&self, caller: Option<&Identity>, id: i16) -> Result<(), ServiceError> {
        authorize(caller, Requirement::AdminOrStaff)?;

        self.categories
            .database()
            .commit(|tables| {
                if !tables.categories.contains_key(&id) {
                    return Err(ServiceError::not_found("Category", id));
                }
                if tables.articles_in_category(id) > 0 {
                    return Err(ServiceError::conflict(
                        "Cannot delete category that has news articles",
                    ));
                }
                for child in tables.categories.values_mut() {
                    if child.parent_id == Some(id) {
                        child.parent_id = None;
                    }
                }
                CategoryRepository::remove_from(tables, &id)?;
                Ok(())
            })
            .await?;

        log::info!("Category {} deleted", id);
        self.notifier.publish(ChangeSignal::CategoriesChanged);
        Ok(())
    }

    pub async fn can_delete(&self, id: i16) -> Result<bool, ServiceError> {
        self.categories
            .database()
            .read(|tables| {
                if !tables.categories.contains_key(&id) {
                    return Err(ServiceError::not_found("Category", id));
                }
                Ok(tables.articles_in_category(id) == 0)
            })
            .await
    }
}

fn ensure_parent_exists(tables: &Tables, parent_id: i16) -> Result<(), ServiceError> {
    if tables.categories.contains_key(&parent_id) {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "Parent category {} does not exist",
            parent_id
        )))
    }
}

/// Rejects self-parenting and any parent whose ancestor chain already reaches `id`.
fn ensure_valid_parent(tables: &Tables, id: i16, parent_id: i16) -> Result<(), ServiceError> {
    if parent_id == id {
        return Err(ServiceError::validation(
            "A category cannot be its own parent",
        ));
    }
    ensure_parent_exists(tables, parent_id)?;

    let mut visited = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id {
            return Err(ServiceError::validation(
                "Parent category would create a cycle",
            ));
        }
        if !visited.insert(current) {
            break;
        }
        cursor = tables
            .categories
            .get(&current)
            .and_then(|category| category.parent_id);
    }
    Ok(())
}
