//! Conversions between entity models and core domain types.

use chrono::{DateTime, FixedOffset, Utc};
use sairex_core::billing::{ChallanStatus, FeeChallan, Student};
use sairex_core::fees::FeeRule;
use sairex_core::ledger::{EntryDirection, LedgerEntry, LedgerEntryType, StudentFinancialSummary};
use sairex_core::payment::{PaymentRecord, PaymentStatus};
use sairex_core::revenue::{
    BillingPlan, RevenueAdjustment, RevenueCalculationMode, RevenueCycle, RevenueCycleStatus,
};

use crate::entities::{
    fee_challans, fee_structures, ledger_entries, organization_billing_plans, payment_records,
    revenue_adjustments, revenue_cycles, sea_orm_active_enums as db_enums,
    student_financial_summaries, students,
};

fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

// ========== Enums ==========

impl From<ChallanStatus> for db_enums::ChallanStatus {
    fn from(status: ChallanStatus) -> Self {
        match status {
            ChallanStatus::Unpaid => Self::Unpaid,
            ChallanStatus::PartiallyPaid => Self::PartiallyPaid,
            ChallanStatus::Paid => Self::Paid,
            ChallanStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<db_enums::ChallanStatus> for ChallanStatus {
    fn from(status: db_enums::ChallanStatus) -> Self {
        match status {
            db_enums::ChallanStatus::Unpaid => Self::Unpaid,
            db_enums::ChallanStatus::PartiallyPaid => Self::PartiallyPaid,
            db_enums::ChallanStatus::Paid => Self::Paid,
            db_enums::ChallanStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<LedgerEntryType> for db_enums::LedgerEntryType {
    fn from(entry_type: LedgerEntryType) -> Self {
        match entry_type {
            LedgerEntryType::ChallanCreated => Self::ChallanCreated,
            LedgerEntryType::PaymentReceived => Self::PaymentReceived,
            LedgerEntryType::Adjustment => Self::Adjustment,
            LedgerEntryType::Refund => Self::Refund,
            LedgerEntryType::Waiver => Self::Waiver,
        }
    }
}

impl From<db_enums::LedgerEntryType> for LedgerEntryType {
    fn from(entry_type: db_enums::LedgerEntryType) -> Self {
        match entry_type {
            db_enums::LedgerEntryType::ChallanCreated => Self::ChallanCreated,
            db_enums::LedgerEntryType::PaymentReceived => Self::PaymentReceived,
            db_enums::LedgerEntryType::Adjustment => Self::Adjustment,
            db_enums::LedgerEntryType::Refund => Self::Refund,
            db_enums::LedgerEntryType::Waiver => Self::Waiver,
        }
    }
}

impl From<EntryDirection> for db_enums::EntryDirection {
    fn from(direction: EntryDirection) -> Self {
        match direction {
            EntryDirection::Debit => Self::Debit,
            EntryDirection::Credit => Self::Credit,
        }
    }
}

impl From<db_enums::EntryDirection> for EntryDirection {
    fn from(direction: db_enums::EntryDirection) -> Self {
        match direction {
            db_enums::EntryDirection::Debit => Self::Debit,
            db_enums::EntryDirection::Credit => Self::Credit,
        }
    }
}

impl From<PaymentStatus> for db_enums::PaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Reconciled => Self::Reconciled,
            PaymentStatus::Failed => Self::Failed,
        }
    }
}

impl From<db_enums::PaymentStatus> for PaymentStatus {
    fn from(status: db_enums::PaymentStatus) -> Self {
        match status {
            db_enums::PaymentStatus::Pending => Self::Pending,
            db_enums::PaymentStatus::Reconciled => Self::Reconciled,
            db_enums::PaymentStatus::Failed => Self::Failed,
        }
    }
}

impl From<RevenueCalculationMode> for db_enums::RevenueCalculationMode {
    fn from(mode: RevenueCalculationMode) -> Self {
        match mode {
            RevenueCalculationMode::OnGeneratedFee => Self::OnGeneratedFee,
            RevenueCalculationMode::OnCollectedFee => Self::OnCollectedFee,
        }
    }
}

impl From<db_enums::RevenueCalculationMode> for RevenueCalculationMode {
    fn from(mode: db_enums::RevenueCalculationMode) -> Self {
        match mode {
            db_enums::RevenueCalculationMode::OnGeneratedFee => Self::OnGeneratedFee,
            db_enums::RevenueCalculationMode::OnCollectedFee => Self::OnCollectedFee,
        }
    }
}

impl From<RevenueCycleStatus> for db_enums::RevenueCycleStatus {
    fn from(status: RevenueCycleStatus) -> Self {
        match status {
            RevenueCycleStatus::Open => Self::Open,
            RevenueCycleStatus::Closed => Self::Closed,
        }
    }
}

impl From<db_enums::RevenueCycleStatus> for RevenueCycleStatus {
    fn from(status: db_enums::RevenueCycleStatus) -> Self {
        match status {
            db_enums::RevenueCycleStatus::Open => Self::Open,
            db_enums::RevenueCycleStatus::Closed => Self::Closed,
        }
    }
}

// ========== Models ==========

impl From<students::Model> for Student {
    fn from(model: students::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            campus_id: model.campus_id,
            grade: model.grade,
            full_name: model.full_name,
        }
    }
}

impl From<fee_structures::Model> for FeeRule {
    fn from(model: fee_structures::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            campus_id: model.campus_id,
            name: model.name,
            amount: model.amount,
            applicable_grade: model.applicable_grade,
            is_active: model.is_active,
        }
    }
}

impl From<fee_challans::Model> for FeeChallan {
    fn from(model: fee_challans::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            campus_id: model.campus_id,
            student_id: model.student_id,
            challan_no: model.challan_no,
            billing_period: model.billing_period,
            issue_date: model.issue_date,
            due_date: model.due_date,
            total_amount: model.total_amount,
            paid_amount: model.paid_amount,
            status: model.status.into(),
            generated_by: model.generated_by,
            cancelled_at: model.cancelled_at.map(utc),
            cancellation_reason: model.cancellation_reason,
            created_at: utc(model.created_at),
        }
    }
}

impl From<ledger_entries::Model> for LedgerEntry {
    fn from(model: ledger_entries::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            campus_id: model.campus_id,
            student_id: model.student_id,
            challan_id: model.challan_id,
            entry_type: model.entry_type.into(),
            direction: model.direction.into(),
            amount: model.amount,
            reference_id: model.reference_id,
            reference_type: model.reference_type,
            entry_date: model.entry_date,
            description: model.description,
            created_at: utc(model.created_at),
        }
    }
}

impl From<student_financial_summaries::Model> for StudentFinancialSummary {
    fn from(model: student_financial_summaries::Model) -> Self {
        Self {
            organization_id: model.organization_id,
            student_id: model.student_id,
            total_debit: model.total_debit,
            total_credit: model.total_credit,
            balance: model.balance,
        }
    }
}

impl From<payment_records::Model> for PaymentRecord {
    fn from(model: payment_records::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            challan_id: model.challan_id,
            amount: model.amount,
            currency: model.currency,
            payment_channel: model.payment_channel,
            gateway: model.gateway,
            reference_number: model.reference_number,
            payment_date: model.payment_date,
            paid_at: utc(model.paid_at),
            status: model.status.into(),
            notes: model.notes,
            recorded_by: model.recorded_by,
            created_at: utc(model.created_at),
        }
    }
}

impl From<organization_billing_plans::Model> for BillingPlan {
    fn from(model: organization_billing_plans::Model) -> Self {
        Self {
            organization_id: model.organization_id,
            revenue_calculation_mode: model.revenue_calculation_mode.into(),
            per_student_fee: model.per_student_fee,
            closing_day: model.closing_day,
        }
    }
}

impl From<revenue_cycles::Model> for RevenueCycle {
    fn from(model: revenue_cycles::Model) -> Self {
        // month and closing_day_used are range-checked by the schema
        Self {
            id: model.id,
            organization_id: model.organization_id,
            month: model.month.unsigned_abs(),
            year: model.year,
            revenue_calculation_mode_used: model.revenue_calculation_mode_used.into(),
            per_student_fee_used: model.per_student_fee_used,
            closing_day_used: model.closing_day_used.unsigned_abs(),
            total_students: model.total_students,
            generated_amount: model.generated_amount,
            collected_amount: model.collected_amount,
            sairex_revenue: model.sairex_revenue,
            status: model.status.into(),
            closed_at: model.closed_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<revenue_adjustments::Model> for RevenueAdjustment {
    fn from(model: revenue_adjustments::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            revenue_cycle_id: model.revenue_cycle_id,
            amount: model.amount,
            reason: model.reason,
            created_by: model.created_by,
            created_at: utc(model.created_at),
        }
    }
}
