//! Pre-authored protocol guidance returned by the rule table.

pub const PREGNANCY_DANGER_SIGNS: &str = "🚨 DANGER SIGNS in Pregnancy (Immediate Referral Needed):\n\n1. Severe headache with blurred vision\n2. Vaginal bleeding\n3. High fever (>101°F)\n4. Severe abdominal pain\n5. Reduced fetal movements\n6. Convulsions\n7. Water breaks before 37 weeks\n\n⚠️ ACTION: Refer immediately to PHC/District Hospital\n📱 Call 108 ambulance if needed\n\n💊 First Aid: Keep mother calm, lying on left side, monitor vitals.";

pub const VACCINATION_SCHEDULE: &str = "💉 CHILD VACCINATION SCHEDULE:\n\nBirth: BCG, OPV-0, Hep-B\n6 weeks: DPT-1, OPV-1, Hep-B-1, Rota-1\n10 weeks: DPT-2, OPV-2, Hep-B-2, Rota-2\n14 weeks: DPT-3, OPV-3, Hep-B-3, Rota-3\n9-12 months: Measles-1, Vitamin A\n16-24 months: DPT booster, OPV booster, Measles-2\n\n📋 Always check the Mother-Child Protection Card!\n⏰ Set follow-up reminders for next dose.";

pub const CHILD_FEVER: &str = "🌡️ MANAGING FEVER IN CHILDREN:\n\n✅ IF fever < 101°F:\n• Sponge with normal water\n• Give paracetamol (10-15 mg/kg)\n• Plenty of fluids\n• Light clothing\n• Monitor every 4 hours\n\n🚨 REFER IF:\n• Fever > 102°F for >3 days\n• Child refuses to eat/drink\n• Difficulty breathing\n• Rash appears\n• Child very drowsy\n• Age < 3 months\n\n📝 Document: Temperature, duration, associated symptoms.";

pub const PREGNANCY_NUTRITION: &str = "🥗 NUTRITION FOR PREGNANT WOMEN:\n\n✅ MUST HAVE:\n• IFA tablets daily (100mg iron + 500μg folic acid)\n• Calcium (1000mg/day)\n• Extra meal (one more than usual)\n• Green leafy vegetables\n• Pulses, eggs, milk\n• Fruits (seasonal)\n\n❌ AVOID:\n• Tobacco, alcohol\n• Raw/undercooked food\n• Too much tea/coffee\n\n💊 Iron tablets: Take with vitamin C (lemon water) for better absorption\n⏰ Check weight gain: 10-12 kg during pregnancy is normal.";

/// Acknowledgment of a voice or image submission; `medium` is "voice" or "image".
pub fn media_acknowledgment(medium: &str) -> String {
    format!(
        "I've received your {medium} input. Based on what you've shared:\n\n• I'll analyze this information according to health protocols\n• If any danger signs are present, I'll alert you immediately\n• Please provide additional context if needed\n\nWhat else would you like to know?"
    )
}

/// Clarification prompt quoting the worker's original question verbatim.
pub fn clarification(question: &str) -> String {
    format!(
        "I understand you're asking about: \"{question}\"\n\nFor the most accurate guidance, please:\n1. Describe the patient's age and symptoms\n2. Mention any danger signs\n3. Let me know the duration of the problem\n\nOr choose from the quick questions below for common topics."
    )
}
