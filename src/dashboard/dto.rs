use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub daily_calorie_goal: i32,
}

#[derive(Debug, Serialize)]
pub struct GoalData {
    pub daily_calorie_goal: i32,
}
