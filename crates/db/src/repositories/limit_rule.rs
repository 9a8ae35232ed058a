//! Card limit rule repository.

use chrono::Utc;
use fuelgate_core::limits::{CardLimitRule, PeriodType, WindowMode};
use fuelgate_shared::types::{CardId, LimitRuleId, Money};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};

use crate::entities::card_limit_rules;

/// Input for creating a limit rule.
#[derive(Debug, Clone)]
pub struct NewLimitRule {
    /// Card the rule applies to.
    pub card_id: CardId,
    /// Period type.
    pub period_type: PeriodType,
    /// Maximum spend per window.
    pub limit: Money,
    /// Window placement.
    pub window_mode: WindowMode,
    /// ANCHOR: day of month.
    pub anchor_day_of_month: Option<i16>,
    /// ANCHOR: cycle length in days.
    pub anchor_length_days: Option<i16>,
    /// ROLLING: window length in hours.
    pub rolling_hours: Option<i32>,
}

impl NewLimitRule {
    /// A CALENDAR rule.
    #[must_use]
    pub const fn calendar(card_id: CardId, period_type: PeriodType, limit: Money) -> Self {
        Self {
            card_id,
            period_type,
            limit,
            window_mode: WindowMode::Calendar,
            anchor_day_of_month: None,
            anchor_length_days: None,
            rolling_hours: None,
        }
    }
}

/// Limit rule repository.
#[derive(Debug, Clone)]
pub struct LimitRuleRepository {
    db: DatabaseConnection,
}

impl LimitRuleRepository {
    /// Creates a new limit rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active rule.
    pub async fn create(&self, input: NewLimitRule) -> Result<CardLimitRule, DbErr> {
        let model = card_limit_rules::ActiveModel {
            id: Set(LimitRuleId::new().into_inner()),
            card_id: Set(input.card_id.into_inner()),
            period_type: Set(input.period_type.into()),
            limit_cents: Set(input.limit.minor()),
            window_mode: Set(input.window_mode.into()),
            anchor_day_of_month: Set(input.anchor_day_of_month),
            anchor_length_days: Set(input.anchor_length_days),
            rolling_hours: Set(input.rolling_hours),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(to_domain(model))
    }

    /// Deactivates a rule. Its usage buckets stay until a rule with another
    /// window supersedes them.
    pub async fn deactivate(&self, id: LimitRuleId) -> Result<bool, DbErr> {
        let result = card_limit_rules::Entity::update_many()
            .col_expr(card_limit_rules::Column::Active, Expr::value(false))
            .filter(card_limit_rules::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Loads the card's active rules. Rules are read without locks.
    pub async fn active_for_card<C: ConnectionTrait>(
        &self,
        conn: &C,
        card_id: CardId,
    ) -> Result<Vec<CardLimitRule>, DbErr> {
        Ok(card_limit_rules::Entity::find()
            .filter(card_limit_rules::Column::CardId.eq(card_id.into_inner()))
            .filter(card_limit_rules::Column::Active.eq(true))
            .order_by_asc(card_limit_rules::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(to_domain)
            .collect())
    }
}

fn to_domain(model: card_limit_rules::Model) -> CardLimitRule {
    CardLimitRule {
        id: LimitRuleId::from_uuid(model.id),
        card_id: CardId::from_uuid(model.card_id),
        period_type: model.period_type.into(),
        limit: Money::from_minor(model.limit_cents),
        window_mode: model.window_mode.into(),
        anchor_day_of_month: model.anchor_day_of_month.map(i32::from),
        anchor_length_days: model.anchor_length_days.map(i32::from),
        rolling_hours: model.rolling_hours,
        active: model.active,
    }
}
