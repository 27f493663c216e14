/// What the planner form collects before asking for a plan.
#[derive(Debug, Clone, Default)]
pub struct TripRequest {
  pub destination: String,
  pub start_date: String,
  pub end_date: String,
  pub activities: Vec<String>,
}

impl TripRequest {
  /// A request needs at least a destination and both dates.
  pub fn is_complete(&self) -> bool {
    !self.destination.trim().is_empty()
      && !self.start_date.trim().is_empty()
      && !self.end_date.trim().is_empty()
  }
}

/// Build the structured prompt sent to the generation endpoint.
///
/// The section list is fixed; activity preferences are appended when
/// present. The closing instructions steer the model away from markdown
/// symbols since the plan is rendered as plain paragraphs.
pub fn build_prompt(request: &TripRequest) -> String {
  let mut prompt = format!(
    "Create a structured travel plan for {} from {} to {}.\n\
     Format the response with clear section headers.\n\
     Include the following sections:\n\n\
     Trip Overview\n\
     - Provide a brief introduction and key details about the destination, including climate, best travel season, and local culture.\n\n\
     Daily Itinerary\n\
     - Outline a detailed day-by-day plan covering sightseeing, activities, and recommendations.\n\
     - Specify morning, afternoon, and evening activities.\n\
     - Suggest must-see landmarks, adventure options, and relaxing spots.\n\n\
     Must-Visit Attractions\n\
     - List key places to visit with a brief description of why they are important.\n\n\
     Local Food Recommendations\n\
     - Mention popular local dishes and must-visit restaurants or street food spots.\n\n\
     Transportation Tips\n\
     - Explain the best ways to get around (public transport, taxis, rental cars, etc.).\n\
     - Mention travel passes or local commuting hacks.\n\n\
     Cultural Customs\n\
     - Share important local customs, traditions, and etiquette to follow.\n\
     - Highlight dress codes, tipping culture, and common greetings.\n",
    request.destination.trim(),
    request.start_date.trim(),
    request.end_date.trim(),
  );

  if !request.activities.is_empty() {
    prompt.push_str(&format!(
      "\nConsider these activities: {}\n\
       - Tailor the itinerary based on these user preferences.\n",
      request.activities.join(", ")
    ));
  }

  prompt.push_str(
    "I do not want any type of symbol in the response.\n\
     Generate a response which is easy to read and understand.\n",
  );

  prompt
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request() -> TripRequest {
    TripRequest {
      destination: "Lisbon".to_string(),
      start_date: "2026-09-01".to_string(),
      end_date: "2026-09-07".to_string(),
      activities: vec!["surfing".to_string(), "food tours".to_string()],
    }
  }

  #[test]
  fn test_prompt_contains_trip_details() {
    let prompt = build_prompt(&request());
    assert!(prompt.contains("Lisbon"));
    assert!(prompt.contains("2026-09-01"));
    assert!(prompt.contains("2026-09-07"));
    assert!(prompt.contains("surfing, food tours"));
  }

  #[test]
  fn test_prompt_contains_all_sections() {
    let prompt = build_prompt(&request());
    for section in [
      "Trip Overview",
      "Daily Itinerary",
      "Must-Visit Attractions",
      "Local Food Recommendations",
      "Transportation Tips",
      "Cultural Customs",
    ] {
      assert!(prompt.contains(section), "missing section {}", section);
    }
  }

  #[test]
  fn test_prompt_without_activities_omits_preferences() {
    let mut request = request();
    request.activities.clear();
    let prompt = build_prompt(&request);
    assert!(!prompt.contains("Consider these activities"));
  }

  #[test]
  fn test_is_complete() {
    assert!(request().is_complete());
    let mut incomplete = request();
    incomplete.end_date = "  ".to_string();
    assert!(!incomplete.is_complete());
  }
}
