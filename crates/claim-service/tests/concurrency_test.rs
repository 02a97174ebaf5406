//! Concurrent activation and review against the in-memory backend

use claim_service::{AppState, MemoryStorage};
use portal_common::{
    Caller, CertifiedCheck, ClaimStatus, ErrorKind, PageRequest, PayoutMethod, Principal,
    WinningEntry,
};
use std::sync::Arc;

const CONTENDERS: usize = 64;

async fn seeded_state() -> Arc<AppState> {
    let state = AppState::new(Arc::new(MemoryStorage::new()), 100);
    state
        .identity
        .bootstrap_admins(&[Principal::new("root").unwrap()])
        .await
        .unwrap();
    state
        .entries
        .import(vec![
            WinningEntry::new("e1", "PN-100", "TK-9", "Car"),
            WinningEntry::new("e2", "PN-200", "TK-7", "Boat"),
        ])
        .await
        .unwrap();
    Arc::new(state)
}

fn caller(id: &str) -> Caller {
    Caller::from(Principal::new(id).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_exactly_one_activation_wins() {
    let state = seeded_state().await;

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                let who = format!("user-{}", i);
                let result = state.entries.claim_winning_entry(&caller(&who), "e1").await;
                (who, result)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        let (who, result) = handle.await.unwrap();
        match result {
            Ok(view) => {
                assert_eq!(view.claimed_by.as_ref().map(|p| p.as_str()), Some(who.as_str()));
                winners.push(who);
            }
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyClaimed),
        }
    }

    assert_eq!(winners.len(), 1);

    let entries = state.entries.get_all_winning_entries(&caller("root")).await.unwrap();
    let e1 = entries.iter().find(|e| e.id == "e1").unwrap();
    assert!(e1.is_claimed);
    assert_eq!(e1.claimed_by.as_ref().unwrap().as_str(), winners[0]);
    assert!(e1.claim_timestamp.is_some());

    // The other entry is untouched
    let e2 = entries.iter().find(|e| e.id == "e2").unwrap();
    assert!(!e2.is_claimed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_review_keeps_claims_consistent() {
    let state = seeded_state().await;

    for i in 0..8 {
        let who = format!("user-{}", i);
        state
            .claims
            .submit(
                &caller(&who),
                claim_service::claims::NewClaim {
                    id: Some(format!("c{}", i)),
                    winner_id: "e1".to_string(),
                    claimant: Principal::new(who.clone()).unwrap(),
                    payout_method: PayoutMethod::CertifiedCheck(CertifiedCheck {
                        bank: "First Bank".to_string(),
                        payee_name: who.clone(),
                    }),
                    id_card_image_id: None,
                    selfie_image_id: None,
                },
            )
            .await
            .unwrap();
    }

    let handles: Vec<_> = (0..8)
        .flat_map(|i| {
            let status_state = state.clone();
            let response_state = state.clone();
            [
                tokio::spawn(async move {
                    status_state
                        .claims
                        .update_claim_status(
                            &caller("root"),
                            &format!("c{}", i),
                            ClaimStatus::Approved,
                        )
                        .await
                }),
                tokio::spawn(async move {
                    response_state
                        .claims
                        .admin_response(&caller("root"), &format!("c{}", i), "Approved")
                        .await
                }),
            ]
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let claims = state
        .claims
        .get_all_claims(&caller("root"), None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(claims.len(), 8);
    for (i, claim) in claims.iter().enumerate() {
        assert_eq!(claim.id, format!("c{}", i));
        assert_eq!(claim.status, ClaimStatus::Approved);
        assert_eq!(claim.admin_response.as_deref(), Some("Approved"));
        assert_eq!(claim.claimant.as_str(), format!("user-{}", i));
    }
}
